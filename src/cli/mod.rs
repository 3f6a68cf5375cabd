use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expose `POST /api/chat` backed by the configured completion provider
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the endpoint on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// Interactive conversation on stdin/stdout; `/quit` or end of input leaves
    Chat,

    /// Send a single prompt and type out the reply
    Ask {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
}
