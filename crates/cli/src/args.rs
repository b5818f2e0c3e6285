use clap::Parser;

use matchlens_core::{Region, RiotId};

/// matchlens - ranked match history insights for one player (and a duo partner)
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "matchlens")]
#[command(version)]
#[command(about = "Ingest recent ranked matches and print the player summary as JSON", long_about = None)]
pub struct Args {
    /// Player handle, e.g. `Faker#KR1`
    pub riot_id: RiotId,

    /// Platform or short region name, e.g. `euw1` or `euw`
    pub region: Region,

    /// Number of recent matches to ingest (clamped to 1-100)
    pub limit: Option<u32>,

    /// Also print the duo summary with this partner
    #[arg(long = "duo", value_name = "NAME#TAG")]
    pub duo: Option<RiotId>,
}
