//! Demo shopper used by the single-session server.

use chrono::{TimeZone, Utc};

use ecosmart_core::UserId;

use crate::account::RewardAccount;
use crate::badge::{Badge, Rarity};

fn earned(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).earliest().unwrap_or_default()
}

pub fn demo_badges() -> Vec<Badge> {
    vec![
        Badge::new("Eco Hero", "Saved 10kg CO₂ this month", "🌱", Rarity::Rare, earned(15)),
        Badge::new("Water Warrior", "Saved 1000L of water", "💧", Rarity::Common, earned(10)),
        Badge::new("Plant Pioneer", "Chose plant-based 20 times", "🌿", Rarity::Epic, earned(20)),
    ]
}

/// 2340 points, $11.50 cash, weekly rank 3, 47.8 kg saved to date.
pub fn demo_account(user_id: UserId) -> RewardAccount {
    RewardAccount::open(user_id, "Sarah Johnson", "sarah.j@email.com")
        .with_balances(2_340, 1_150, 47.8, 3)
        .with_badges(demo_badges())
}
