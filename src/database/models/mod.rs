pub mod burn_event;
pub mod coin;

pub use burn_event::BurnEvent;
pub use coin::{Chain, Coin, CoinStatus, CoinWithStatus};

use serde::{Deserialize, Serialize};

/// The persisted document: every coin plus the burn-event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinsData {
    #[serde(default)]
    pub coins: Vec<Coin>,
    #[serde(default)]
    pub burn_events: Vec<BurnEvent>,
}

impl CoinsData {
    pub fn find_coin(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|coin| coin.id == id)
    }

    pub fn find_coin_mut(&mut self, id: &str) -> Option<&mut Coin> {
        self.coins.iter_mut().find(|coin| coin.id == id)
    }
}
