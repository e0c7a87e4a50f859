use serde::{Deserialize, Serialize};

/// A single stock record (spec §3). `quantity` is the number of shares
/// currently available to buy; `volume` is the cumulative count traded,
/// monotonically non-decreasing (invariant C2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub name: String,
    pub price: f64,
    pub quantity: u64,
    pub volume: u64,
}

impl Stock {
    pub fn new(name: impl Into<String>, price: f64, quantity: u64, volume: u64) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
            volume,
        }
    }

    /// CSV row in `name,price,quantity,volume` order (spec §6).
    pub fn to_csv_row(&self) -> String {
        format!("{},{},{},{}", self.name, self.price, self.quantity, self.volume)
    }

    pub fn from_csv_row(row: &str) -> Option<Self> {
        let mut parts = row.splitn(4, ',');
        let name = parts.next()?.to_string();
        let price: f64 = parts.next()?.parse().ok()?;
        let quantity: u64 = parts.next()?.parse().ok()?;
        let volume: u64 = parts.next()?.parse().ok()?;
        Some(Self::new(name, price, quantity, volume))
    }
}
