use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use goapbot::{
    sub_goal, Action, ActionRegistry, ActionResult, AgentError, ApiError, FightAction, GameApi,
    GoalManager, MapContent, MapTile, Monster, Plan, RecursiveActionExecutor, Result, StateKey,
    SubGoalRequest, WorldSnapshot, WorldState,
};

mod support;
use support::{test_character, MockGameApi};

fn fixture_world() -> Arc<WorldSnapshot> {
    Arc::new(WorldSnapshot {
        maps: vec![
            MapTile {
                x: 0,
                y: 0,
                content: None,
            },
            MapTile {
                x: 5,
                y: 5,
                content: Some(MapContent {
                    content_type: "monster".to_string(),
                    code: "goblin".to_string(),
                }),
            },
            MapTile {
                x: 4,
                y: 1,
                content: Some(MapContent {
                    content_type: "bank".to_string(),
                    code: "bank".to_string(),
                }),
            },
        ],
        monsters: vec![Monster {
            code: "goblin".to_string(),
            name: "Goblin".to_string(),
            level: 4,
            hp: 60,
        }],
        resources: vec![],
        items: vec![],
    })
}

fn executor_for(api: &Arc<MockGameApi>, world: &Arc<WorldSnapshot>) -> RecursiveActionExecutor {
    let _ = env_logger::builder().is_test(true).try_init();
    RecursiveActionExecutor::new(
        Arc::clone(api) as Arc<dyn GameApi>,
        Arc::new(ActionRegistry::with_default_factories()),
        Arc::new(GoalManager::new()),
        Arc::clone(world),
    )
}

fn fight_plan(world: &Arc<WorldSnapshot>, level_claim: i64) -> Plan {
    Plan::new(vec![Arc::new(FightAction::new(
        "goblin",
        4,
        5,
        5,
        level_claim,
        Arc::clone(world),
    ))])
}

fn state_for(api: &MockGameApi, world: &Arc<WorldSnapshot>) -> WorldState {
    goapbot::world_state_from_character(&api.character_snapshot(), world)
}

/// Fails once with the given sub-goal requests, then succeeds.
struct FlakyAction {
    requests: Vec<SubGoalRequest>,
    failed_once: AtomicBool,
}

impl FlakyAction {
    fn new(requests: Vec<SubGoalRequest>) -> Self {
        Self {
            requests,
            failed_once: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Action for FlakyAction {
    fn name(&self) -> String {
        "flaky".to_string()
    }

    fn cost(&self) -> u32 {
        1
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
    }

    fn effects(&self) -> WorldState {
        WorldState::new().with(StateKey::AtSafeLocation, true)
    }

    async fn execute(
        &self,
        _character_id: &str,
        _state: &WorldState,
        _api: &dyn GameApi,
    ) -> Result<ActionResult> {
        if self.failed_once.swap(true, Ordering::SeqCst) {
            Ok(ActionResult::succeeded("worked", WorldState::new(), 0))
        } else {
            Ok(ActionResult::failed_with_sub_goals(
                "blocked on first try",
                self.requests.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_plan_succeeds_immediately() {
        let world = fixture_world();
        let api = Arc::new(MockGameApi::new(test_character(), Arc::clone(&world)));
        let executor = executor_for(&api, &world);

        let report = executor
            .run(&Plan::empty(), "kiera", WorldState::new())
            .await;

        assert!(report.success);
        assert_eq!(report.actions_executed, 0);
        assert_eq!(report.depth_reached, 0);
        assert!(api.action_calls().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_fight_recurses_into_move_then_retries() {
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        let executor = executor_for(&api, &world);
        let state = state_for(&api, &world);

        let report = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap();

        assert!(report.success, "report: {:?}", report.error_message);
        assert_eq!(report.depth_reached, 1);
        assert_eq!(api.action_calls(), vec!["move(5,5)", "fight"]);
        assert_eq!(api.character_snapshot().level, 6);
    }

    #[tokio::test]
    async fn test_max_depth_zero_rejects_before_any_action() {
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        let executor = executor_for(&api, &world).with_max_depth(0);
        let state = state_for(&api, &world);

        let err = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AgentError::MaxDepthExceeded {
                depth: 0,
                max_depth: 0
            }
        ));
        assert!(api.all_calls().is_empty());
    }

    #[tokio::test]
    async fn test_max_depth_error_folds_into_run_report() {
        let world = fixture_world();
        let api = Arc::new(MockGameApi::new(test_character(), Arc::clone(&world)));
        let executor = executor_for(&api, &world).with_max_depth(0);

        let report = executor
            .run(&fight_plan(&world, 6), "kiera", WorldState::new())
            .await;

        assert!(!report.success);
        assert!(report
            .error_message
            .as_deref()
            .unwrap()
            .contains("Maximum recursion depth exceeded"));
    }

    #[tokio::test]
    async fn test_recursion_blocked_one_level_down() {
        // max_depth 1: the fight itself may run, but the move sub-goal
        // would enter depth 1 and is rejected on entry.
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        let executor = executor_for(&api, &world).with_max_depth(1);
        let state = state_for(&api, &world);

        let err = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::MaxDepthExceeded { .. }));
        // The sub-plan never ran an action against the server.
        assert!(api.action_calls().is_empty());
    }

    #[tokio::test]
    async fn test_sub_goals_resolved_in_descending_priority() {
        // Low HP (priority 9: recover_hp) and wrong tile (priority 6:
        // move_to_location). The rest must happen before the move.
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        character.hp = 30;
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        let executor = executor_for(&api, &world);
        let state = state_for(&api, &world);

        let report = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap();

        assert!(report.success, "report: {:?}", report.error_message);
        assert_eq!(api.action_calls(), vec!["rest", "move(5,5)", "fight"]);
        assert_eq!(report.depth_reached, 1);
        // 3 fight attempts + rest + move, nested attempts included
        assert_eq!(report.actions_executed, 5);
    }

    #[tokio::test]
    async fn test_unknown_sub_goal_type_falls_through_to_next_request() {
        let world = fixture_world();
        let api = Arc::new(MockGameApi::new(test_character(), Arc::clone(&world)));
        let executor = executor_for(&api, &world);

        let plan = Plan::new(vec![Arc::new(FlakyAction::new(vec![
            SubGoalRequest::new("summon_dragon", 9, "flaky", "please"),
            SubGoalRequest::new(sub_goal::MOVE_TO_LOCATION, 6, "flaky", "go to the bank")
                .with_param("target_x", 4)
                .with_param("target_y", 1),
        ]))]);
        let state = state_for(&api, &world);

        let report = executor
            .execute_plan_recursive(&plan, "kiera", state, 0)
            .await
            .unwrap();

        assert!(report.success, "report: {:?}", report.error_message);
        // The unknown type was skipped, the move request resolved.
        assert_eq!(api.action_calls(), vec!["move(4,1)"]);
    }

    #[tokio::test]
    async fn test_failure_without_sub_goals_is_terminal() {
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        character.x = 5;
        character.y = 5;
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        api.fail_next_fight(ApiError::NotAllowed("monster fled".to_string()));
        let executor = executor_for(&api, &world);
        let state = state_for(&api, &world);

        let report = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap();

        assert!(!report.success);
        assert!(report.error_message.as_deref().unwrap().contains("monster fled"));
        // No retry for a terminal failure.
        assert_eq!(api.action_calls(), vec!["fight"]);
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        character.x = 5;
        character.y = 5;
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        api.fail_next_fight(ApiError::Transport("connection reset".to_string()));
        let executor = executor_for(&api, &world);
        let state = state_for(&api, &world);

        let err = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Api(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_regressed_state_after_sub_plan_fails_the_attempt() {
        // Every move drops the character's level: the move sub-plan
        // "succeeds" but leaves a state the parent must reject.
        let world = fixture_world();
        let mut character = test_character();
        character.weapon_slot = "copper_dagger".to_string();
        let api = Arc::new(MockGameApi::new(character, Arc::clone(&world)));
        *api.level_drop_on_move.lock().unwrap() = true;
        let executor = executor_for(&api, &world);
        let state = state_for(&api, &world);

        let report = executor
            .execute_plan_recursive(&fight_plan(&world, 6), "kiera", state, 0)
            .await
            .unwrap();

        assert!(!report.success);
        // The fight itself was never issued to the server.
        assert!(!api.action_calls().contains(&"fight".to_string()));
    }
}
