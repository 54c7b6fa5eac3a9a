//! perf-split - Split the value change of a portfolio into its causes.

fn main() -> std::process::ExitCode {
    perfledger::cmd::split_cmd::main()
}
