use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// File containing queries and db details
    #[arg(short, long, default_value = "markfile.json")]
    pub markfile: String,

    /// List available queries
    #[arg(short, long)]
    pub list_queries: bool,

    /// The query to run, with arguments: `name:arg1,arg2,key=val`
    #[arg(required_unless_present = "list_queries")]
    pub query: Option<String>,
}
