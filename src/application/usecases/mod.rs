pub mod check_rewards;
pub mod dispatch_actions;

pub use check_rewards::CheckRewardsUseCase;
pub use dispatch_actions::DispatchActionsUseCase;
