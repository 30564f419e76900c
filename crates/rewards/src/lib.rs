//! Reward ledger (EcoPoints, cash balance, badges).
//!
//! Awards are flat constants per event: a swap earns the same bonus whatever
//! it saves. The account is an aggregate so every balance change is an event
//! that can be recorded elsewhere.

pub mod account;
pub mod badge;
pub mod demo;
pub mod redemption;

pub use account::{
    AwardBadge, BadgeAwarded, ECO_SCAN_CO2_SAVED_KG, ECO_SCAN_POINTS, OPTIMIZATION_BONUS_CASH_CENTS,
    OPTIMIZATION_BONUS_POINTS, OptimizationRewarded, Preferences, RecordOptimization, RecordScan,
    RecordSwap, RedeemReward, RewardAccount, RewardCommand, RewardEvent, RewardRedeemed, SCAN_POINTS,
    SWAP_BONUS_POINTS, ScanRewarded, SwapRewarded,
};
pub use badge::{Badge, Rarity};
pub use demo::{demo_account, demo_badges};
pub use redemption::{REWARD_OPTIONS, RewardOption, find_reward};
