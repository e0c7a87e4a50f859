use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "buy",
            OrderType::Sell => "sell",
        }
    }

    /// Sign applied to the Catalog `quantity_change` (spec §4.2 step c):
    /// a buy removes shares from the pool, a sell returns them to it.
    pub fn catalog_delta(&self, quantity: u64) -> i64 {
        match self {
            OrderType::Buy => -(quantity as i64),
            OrderType::Sell => quantity as i64,
        }
    }
}

impl std::str::FromStr for OrderType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(OrderType::Buy),
            "sell" => Ok(OrderType::Sell),
            _ => Err(()),
        }
    }
}

/// A single placed order (spec §3, §4.2). `transaction_id` is assigned by
/// the leader and is gap-free there; followers receive it via sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub transaction_id: i64,
    pub stock_name: String,
    pub order_type: OrderType,
    pub quantity: u64,
}

impl OrderRecord {
    /// CSV row in `transaction_id,stock_name,order_type,quantity` order.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.transaction_id,
            self.stock_name,
            self.order_type.as_str(),
            self.quantity
        )
    }

    pub fn from_csv_row(row: &str) -> Option<Self> {
        let mut parts = row.splitn(4, ',');
        let transaction_id: i64 = parts.next()?.parse().ok()?;
        let stock_name = parts.next()?.to_string();
        let order_type: OrderType = parts.next()?.parse().ok()?;
        let quantity: u64 = parts.next()?.parse().ok()?;
        Some(Self {
            transaction_id,
            stock_name,
            order_type,
            quantity,
        })
    }
}
