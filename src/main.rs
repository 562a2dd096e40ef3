use modelgen::cli;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
