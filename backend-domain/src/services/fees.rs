use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    percent: Decimal,
}

impl FeeSchedule {
    pub fn new(percent: Decimal) -> Self {
        Self { percent }
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    /// Fee is rounded to kobo; net is derived by subtraction so the two always sum to `amount`.
    pub fn split(&self, amount: Decimal) -> FeeSplit {
        let platform_fee = (amount * self.percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        FeeSplit {
            platform_fee,
            net_amount: amount - platform_fee,
        }
    }
}
