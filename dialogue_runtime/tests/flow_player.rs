//! End-to-end behaviour of the flow player over in-memory graphs.

use dialogue_runtime::{
    Branch, FlowError, FlowEvent, FlowGraph, FlowPlayer, FlowPlayerConfig, NodeId, NodeKind,
    PausableKind, PauseMask, PlayerState, RhaiScriptEngine, VariableStore,
};

fn variables() -> VariableStore {
    VariableStore::from_toml_str(
        r#"
        [Game]
        gold = 10
        door_open = false
        visits = 0

        [Hero]
        name = "Aria"
        "#,
    )
    .unwrap()
}

fn player(graph: &FlowGraph) -> FlowPlayer<&FlowGraph, RhaiScriptEngine> {
    FlowPlayer::with_defaults(graph, RhaiScriptEngine::new(), variables())
}

fn player_with(graph: &FlowGraph, config: FlowPlayerConfig) -> FlowPlayer<&FlowGraph, RhaiScriptEngine> {
    FlowPlayer::new(graph, RhaiScriptEngine::new(), variables(), config).unwrap()
}

fn targets(branches: &[Branch]) -> Vec<NodeId> {
    branches.iter().filter_map(Branch::target).collect()
}

#[test]
fn test_shadow_round_trip() {
    let graph = FlowGraph::new();
    let mut player = player(&graph);

    player.shadowed_operation(|p| {
        let vars = p.variables_mut();
        vars.set_int("Game.gold", 999).unwrap();
        vars.set_bool("Game.door_open", true).unwrap();
        vars.set_string("Hero.name", "Bran").unwrap();
        assert!(p.is_shadowed());
    });

    let vars = player.variables();
    assert_eq!(vars.get_int("Game.gold"), 10);
    assert!(!vars.get_bool("Game.door_open"));
    assert_eq!(vars.get_string("Hero.name"), "Aria");
    assert!(!player.is_shadowed());
}

#[test]
fn test_nested_shadows_restore_each_level() {
    let graph = FlowGraph::new();
    let mut player = player(&graph);

    player.shadowed_operation(|outer| {
        outer.variables_mut().set_int("Game.gold", 20).unwrap();

        outer.shadowed_operation(|inner| {
            inner.variables_mut().set_int("Game.gold", 30).unwrap();
            inner.variables_mut().set_bool("Game.door_open", true).unwrap();
            assert_eq!(inner.shadow_level(), 2);
        });

        assert_eq!(outer.variables().get_int("Game.gold"), 20);
        assert!(!outer.variables().get_bool("Game.door_open"));
    });

    assert_eq!(player.variables().get_int("Game.gold"), 10);
    assert_eq!(player.shadow_level(), 0);
}

#[test]
fn test_shadow_restores_after_panic() {
    let graph = FlowGraph::new();
    let mut player = player(&graph);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        player.shadowed_operation(|p| {
            p.variables_mut().set_int("Game.gold", 0).unwrap();
            panic!("script host crashed");
        })
    }));

    assert!(result.is_err());
    assert_eq!(player.variables().get_int("Game.gold"), 10);
    assert_eq!(player.shadow_level(), 0);
    assert_eq!(player.variables().shadow_level(), 0);
}

#[test]
fn test_cycle_is_bounded_by_explore_limit() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::hub());
    let b = graph.add_node(NodeKind::hub());
    let c = graph.add_node(NodeKind::hub());
    graph.link(a, b).unwrap();
    graph.link(b, c).unwrap();
    graph.link(c, a).unwrap();

    let config = FlowPlayerConfig {
        explore_limit: 10,
        ignore_invalid_branches: false,
        ..FlowPlayerConfig::default()
    };
    let mut player = player_with(&graph, config);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();

    assert!(!branches.is_empty());
    assert!(branches.iter().all(|b| !b.is_empty() && b.len() <= 10));
    assert!(branches.iter().all(|b| !b.is_valid()));
}

#[test]
fn test_pause_semantics() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Halt!"));
    let b = graph.add_node(NodeKind::line("Hero", "A friend."));
    let c = graph.add_node(NodeKind::line("Guard", "Pass."));
    graph.link(a, b).unwrap();
    graph.link(b, c).unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();

    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].path(), &[a, b]);
    assert!(branches[0].is_valid());
}

#[test]
fn test_non_pausable_nodes_are_walked_through() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Halt!"));
    let hub = graph.add_node(NodeKind::hub());
    let yes = graph.add_node(NodeKind::line("Hero", "Yes"));
    let no = graph.add_node(NodeKind::line("Hero", "No"));
    graph.link(a, hub).unwrap();
    graph.link(hub, yes).unwrap();
    graph.link(hub, no).unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![yes, no]);
    assert_eq!(branches[1].path(), &[a, hub, no]);

    player.set_pause_on(PauseMask::from_kinds([PausableKind::Hub, PausableKind::Line]));
    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![hub]);
}

#[test]
fn test_guard_gating() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "What do you want?"));
    let bribe = graph.add_node(NodeKind::line("Hero", "Here, take some gold."));
    let leave = graph.add_node(NodeKind::line("Hero", "Nothing."));
    graph.link(a, bribe).unwrap();
    graph.link(a, leave).unwrap();
    graph.set_guard(bribe, 0, "Game.gold >= 50").unwrap();

    let config = FlowPlayerConfig {
        ignore_invalid_branches: false,
        ..FlowPlayerConfig::default()
    };
    let mut player = player_with(&graph, config);
    player.set_cursor(a).unwrap();

    let branches = player.update_available_branches().unwrap();
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].path(), &[a, bribe]);
    assert!(!branches[0].is_valid());
    assert!(branches[1].is_valid());

    player.variables_mut().set_int("Game.gold", 50).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert!(branches.iter().all(Branch::is_valid));
}

#[test]
fn test_undeclared_guard_uses_default() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Elder", "Have we met?"));
    let intro = graph.add_node(NodeKind::line("Hero", "I am new here."));
    let back = graph.add_node(NodeKind::line("Hero", "I came back."));
    graph.link(a, intro).unwrap();
    graph.link(a, back).unwrap();
    graph.set_guard(intro, 0, "!Quest.met_elder").unwrap();
    graph.set_guard(back, 0, "Quest.met_elder").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![intro]);
}

#[test]
fn test_invalid_branches_hidden_and_reindexed() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Well?"));
    let locked = graph.add_node(NodeKind::line("Hero", "Open the door."));
    let ask = graph.add_node(NodeKind::line("Hero", "Who are you?"));
    graph.link(a, locked).unwrap();
    graph.link(a, ask).unwrap();
    graph.set_guard(locked, 0, "Game.door_open").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();

    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].target(), Some(ask));
    assert_eq!(branches[0].index(), 0);

    player.play(0).unwrap();
    assert_eq!(player.cursor(), Some(ask));
}

#[test]
fn test_commit_versus_shadow() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Merchant", "That will be five gold."));
    let b = graph.add_node(NodeKind::line("Hero", "Here you go."));
    graph.link(a, b).unwrap();
    graph.set_instruction(a, 0, "Game.gold -= 5; Game.visits += 1;").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    player.update_available_branches().unwrap();

    assert_eq!(player.variables().get_int("Game.gold"), 10);
    assert_eq!(player.variables().get_int("Game.visits"), 0);

    player.play(0).unwrap();

    assert_eq!(player.variables().get_int("Game.gold"), 5);
    assert_eq!(player.variables().get_int("Game.visits"), 1);
    assert_eq!(player.cursor(), Some(b));
}

#[test]
fn test_instruction_node_commits_once() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Open the gate!"));
    let open = graph.add_node(NodeKind::instruction("Game.door_open = true; Game.visits += 1;"));
    let b = graph.add_node(NodeKind::line("Guard", "It is open."));
    graph.link(a, open).unwrap();
    graph.link(open, b).unwrap();
    graph.set_guard(b, 0, "Game.door_open").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert_eq!(branches[0].path(), &[a, open, b]);
    assert!(!player.variables().get_bool("Game.door_open"));

    player.play(0).unwrap();
    assert!(player.variables().get_bool("Game.door_open"));
    assert_eq!(player.variables().get_int("Game.visits"), 1);
}

#[test]
fn test_dead_end_instruction_is_not_replayed() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Farewell."));
    let fin = graph.add_node(NodeKind::instruction("Game.visits += 1"));
    graph.link(a, fin).unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    player.update_available_branches().unwrap();
    player.play(0).unwrap();
    assert_eq!(player.cursor(), Some(fin));
    assert_eq!(player.variables().get_int("Game.visits"), 1);

    let branches = player.update_available_branches().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].path(), &[fin]);
    assert!(branches[0].is_valid());
    player.play(0).unwrap();
    assert_eq!(player.cursor(), Some(fin));
    assert_eq!(player.variables().get_int("Game.visits"), 1);

    // Positioning the cursor explicitly runs the node again on the next play.
    player.set_cursor(fin).unwrap();
    player.update_available_branches().unwrap();
    player.play(0).unwrap();
    assert_eq!(player.variables().get_int("Game.visits"), 2);
}

#[test]
fn test_sibling_instruction_does_not_open_guard() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Well?"));
    let pay = graph.add_node(NodeKind::line("Hero", "I paid the toll."));
    let enter = graph.add_node(NodeKind::line("Hero", "Let me in."));
    let second = graph.add_output_pin(a, None).unwrap();
    graph.connect(a, 0, pay, 0).unwrap();
    graph.connect(a, second, enter, 0).unwrap();
    graph.set_instruction(a, 0, "Game.door_open = true").unwrap();
    graph.set_guard(enter, 0, "Game.door_open").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![pay]);

    player.play(0).unwrap();
    assert!(player.variables().get_bool("Game.door_open"));
}

#[test]
fn test_jump_redirects_to_target_pin() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Follow me."));
    let c = graph.add_node(NodeKind::line("Guard", "Here we are."));
    let side = graph.add_input_pin(c).unwrap();
    assert_eq!(side, 1);
    let jump = graph.add_node(NodeKind::jump(c, side));
    graph.link(a, jump).unwrap();

    graph.set_guard(c, 0, "false").unwrap();
    graph.set_guard(c, 1, "Game.door_open").unwrap();

    let config = FlowPlayerConfig {
        ignore_invalid_branches: false,
        ..FlowPlayerConfig::default()
    };
    let mut player = player_with(&graph, config);
    player.set_cursor(a).unwrap();

    let branches = player.update_available_branches().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].path(), &[a, jump, c]);
    assert!(!branches[0].is_valid());

    player.variables_mut().set_bool("Game.door_open", true).unwrap();
    let branches = player.update_available_branches().unwrap();
    assert!(branches[0].is_valid());

    player.play(0).unwrap();
    assert_eq!(player.cursor(), Some(c));
}

#[test]
fn test_condition_routes_by_variables() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Merchant", "Buying?"));
    let check = graph.add_node(NodeKind::condition("Game.gold >= 10"));
    let sold = graph.add_node(NodeKind::line("Merchant", "Sold!"));
    let broke = graph.add_node(NodeKind::line("Merchant", "Come back richer."));
    graph.link(a, check).unwrap();
    graph.connect(check, 0, sold, 0).unwrap();
    graph.connect(check, 1, broke, 0).unwrap();
    graph.set_instruction(check, 0, "Game.gold -= 10").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    assert_eq!(targets(player.update_available_branches().unwrap()), vec![sold]);
    player.play(0).unwrap();
    assert_eq!(player.variables().get_int("Game.gold"), 0);

    player.set_cursor(a).unwrap();
    assert_eq!(targets(player.update_available_branches().unwrap()), vec![broke]);
}

#[test]
fn test_failing_scripts_fail_closed() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Hmm."));
    let broken_guard = graph.add_node(NodeKind::line("Hero", "Broken guard"));
    let broken_instruction = graph.add_node(NodeKind::line("Hero", "Broken instruction"));
    graph.link(a, broken_guard).unwrap();
    let second = graph.add_output_pin(a, None).unwrap();
    graph.connect(a, second, broken_instruction, 0).unwrap();
    graph.set_guard(broken_guard, 0, "Game.gold >").unwrap();
    graph.set_instruction(a, second, "Game.gold = \"lots\"").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();

    assert_eq!(targets(branches), vec![broken_instruction]);
    player.play(0).unwrap();
    assert_eq!(player.cursor(), Some(broken_instruction));
    assert_eq!(player.variables().get_int("Game.gold"), 10);
}

#[test]
fn test_dangling_edge_truncates_branch() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Go on."));
    let b = graph.add_node(NodeKind::line("Hero", "Bye."));
    let gone = graph.add_node(NodeKind::line("Ghost", "..."));
    graph.link(a, b).unwrap();
    graph.link(a, gone).unwrap();
    graph.remove_node(gone);
    let ghost = NodeId::new();
    graph.get_node_mut(a).unwrap().output_pins[0]
        .edges
        .push(dialogue_runtime::Edge {
            target_node: ghost,
            target_pin: 0,
        });

    let config = FlowPlayerConfig {
        ignore_invalid_branches: false,
        ..FlowPlayerConfig::default()
    };
    let mut player = player_with(&graph, config);
    player.set_cursor(a).unwrap();
    let branches = player.update_available_branches().unwrap();

    assert_eq!(branches.len(), 2);
    assert_eq!(branches[1].path(), &[a, ghost]);
    assert!(!branches[1].is_valid());
}

#[test]
fn test_shadow_limit_skips_exploration() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Halt"));
    let b = graph.add_node(NodeKind::line("Hero", "Hi"));
    graph.link(a, b).unwrap();

    let config = FlowPlayerConfig {
        shadow_level_limit: 0,
        ..FlowPlayerConfig::default()
    };
    let mut player = player_with(&graph, config);
    player.set_cursor(a).unwrap();

    assert_eq!(
        player.update_available_branches().err(),
        Some(FlowError::ShadowLimitReached { limit: 0 })
    );
    assert!(player.available_branches().is_empty());
    assert_eq!(player.state(), PlayerState::Positioned);
}

#[test]
fn test_finish_paused_object_through_pin() {
    let mut graph = FlowGraph::new();
    let menu = graph.add_node(NodeKind::line("Innkeeper", "Room or meal?"));
    let room = graph.add_node(NodeKind::line("Innkeeper", "Upstairs."));
    let meal = graph.add_node(NodeKind::line("Innkeeper", "Stew it is."));
    let second = graph.add_output_pin(menu, Some("Meal".to_string())).unwrap();
    graph.connect(menu, 0, room, 0).unwrap();
    graph.connect(menu, second, meal, 0).unwrap();
    graph.set_instruction(menu, second, "Game.gold -= 2").unwrap();

    let mut player = player(&graph);
    player.set_cursor(menu).unwrap();

    assert_eq!(
        player.finish_current_paused_object(7),
        Err(FlowError::PinNotFound { node: menu, index: 7 })
    );

    assert_eq!(player.finish_current_paused_object(second), Ok(true));
    assert_eq!(player.cursor(), Some(meal));
    assert_eq!(player.variables().get_int("Game.gold"), 8);
    assert_eq!(player.state(), PlayerState::Paused);
}

#[test]
fn test_finish_paused_object_without_valid_branch() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Password?"));
    let b = graph.add_node(NodeKind::line("Hero", "Swordfish"));
    graph.link(a, b).unwrap();
    graph.set_guard(b, 0, "false").unwrap();

    let mut player = player(&graph);
    player.set_cursor(a).unwrap();

    assert_eq!(player.finish_current_paused_object(0), Ok(false));
    assert_eq!(player.cursor(), Some(a));
}

#[test]
fn test_start_fast_forwards_to_first_pause() {
    let mut graph = FlowGraph::new();
    let entry = graph.add_node(NodeKind::hub());
    let setup = graph.add_node(NodeKind::instruction("Game.visits += 1"));
    let first_line = graph.add_node(NodeKind::line("Guard", "Welcome back."));
    graph.link(entry, setup).unwrap();
    graph.link(setup, first_line).unwrap();

    let config = FlowPlayerConfig::from_toml_str(&format!("start_on = \"{}\"", entry)).unwrap();
    let mut player = player_with(&graph, config);
    player.start().unwrap();

    assert_eq!(player.cursor(), Some(first_line));
    assert_eq!(player.state(), PlayerState::Paused);
    assert_eq!(player.variables().get_int("Game.visits"), 1);

    let events = player.drain_events();
    assert_eq!(events.last(), Some(&FlowEvent::Paused { node: first_line }));
    assert!(events.contains(&FlowEvent::CursorChanged { node: Some(entry) }));
}

#[test]
fn test_start_on_pausable_node_stays() {
    let mut graph = FlowGraph::new();
    let a = graph.add_node(NodeKind::line("Guard", "Halt"));
    let b = graph.add_node(NodeKind::line("Hero", "Hi"));
    graph.link(a, b).unwrap();

    let mut player = player(&graph);
    player.set_start_node(a).unwrap();
    player.start().unwrap();

    assert_eq!(player.cursor(), Some(a));
    assert_eq!(player.state(), PlayerState::Paused);
    assert_eq!(player.drain_events().last(), Some(&FlowEvent::Paused { node: a }));
}

#[test]
fn test_full_conversation() {
    let mut graph = FlowGraph::new();
    let greet = graph.add_node(NodeKind::line("Guard", "Who goes there?"));
    let choice = graph.add_node(NodeKind::hub());
    let polite = graph.add_node(NodeKind::line("Hero", "A humble traveller."));
    let rude = graph.add_node(NodeKind::line("Hero", "None of your business."));
    let open = graph.add_node(NodeKind::instruction("Game.door_open = true"));
    let welcome = graph.add_node(NodeKind::line("Guard", "Then enter."));
    let refuse = graph.add_node(NodeKind::line("Guard", "Then leave."));

    graph.link(greet, choice).unwrap();
    graph.link(choice, polite).unwrap();
    graph.link(choice, rude).unwrap();
    graph.link(polite, open).unwrap();
    graph.link(open, welcome).unwrap();
    graph.link(rude, refuse).unwrap();

    let mut player = player(&graph);
    player.set_start_node(greet).unwrap();
    player.start().unwrap();

    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![polite, rude]);
    player.play(0).unwrap();

    let branches = player.update_available_branches().unwrap();
    assert_eq!(targets(branches), vec![welcome]);
    assert!(!player.variables().get_bool("Game.door_open"));
    player.play(0).unwrap();

    assert_eq!(player.cursor(), Some(welcome));
    assert!(player.variables().get_bool("Game.door_open"));

    let branches = player.update_available_branches().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].path(), &[welcome]);

    player.reset();
    assert_eq!(player.state(), PlayerState::Idle);
    assert!(player.variables().get_bool("Game.door_open"));
}
