use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run cycles forever, sleeping the fetch interval in between
    Run {
        #[arg(long, help = "Stop after this many cycles")]
        max_cycles: Option<usize>,
    },
    /// Run a single cycle and exit
    Once {
        #[arg(
            long,
            help = "If specified, writes the JSON cycle report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Print the resolved configuration with secrets redacted
    ShowConfig,
    /// Report which mapped tables exist in the destination
    CheckTables {
        #[arg(long, help = "Print the table status as JSON instead of a table")]
        json: bool,
    },
    /// Test the destination database connection
    TestConn {
        /// Connection string; defaults to DATABASE_URL
        #[arg(long)]
        conn_str: Option<String>,
    },
}
