use serde::Serialize;

/// Points-for-cash exchange offered on the rewards dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardOption {
    pub id: &'static str,
    pub name: &'static str,
    pub cost_points: u64,
    pub cash_cents: u64,
}

pub const REWARD_OPTIONS: [RewardOption; 3] = [
    RewardOption {
        id: "1",
        name: "$5 Cash",
        cost_points: 200,
        cash_cents: 500,
    },
    RewardOption {
        id: "2",
        name: "$10 Cash",
        cost_points: 400,
        cash_cents: 1_000,
    },
    RewardOption {
        id: "3",
        name: "$25 Cash",
        cost_points: 1_000,
        cash_cents: 2_500,
    },
];

pub fn find_reward(id: &str) -> Option<RewardOption> {
    REWARD_OPTIONS.iter().copied().find(|r| r.id == id)
}
