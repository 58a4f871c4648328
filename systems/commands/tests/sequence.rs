mod support;

use std::time::Duration;

use maple_bot_core::{Clock, Direction, Key, Position};
use maple_bot_system_commands::{
    keys, Buff, Command, Goto, Routine, Shikigami, Wait, Yaksha,
};
use maple_bot_world::simulation::KeyEvent;
use support::Rig;

fn rig_with_labels(text: &str) -> Rig {
    let mut rig = Rig::new(Default::default(), Position::new(0.5, 0.5));
    rig.labels = Routine::parse(text).expect("valid routine").labels().clone();
    rig
}

#[test]
fn goto_moves_the_cursor_to_the_label() {
    let mut rig = rig_with_labels("Tengu\n@, label=loop\nBuff\n");
    rig.cursor = 2;

    rig.execute(&mut Command::Goto(Goto::new("loop")));

    assert_eq!(rig.cursor, 1);
}

#[test]
fn goto_missing_label_leaves_the_cursor_unchanged() {
    let mut rig = rig_with_labels("Tengu\n@, label=loop\nBuff\n");
    rig.cursor = 2;

    let logs = support::capture_logs(|| {
        rig.execute(&mut Command::Goto(Goto::new("missing_label")));
    });

    assert_eq!(rig.cursor, 2);
    assert!(logs.contains("WARN"), "missing label is a warning: {logs}");
    assert!(logs.contains("label does not exist"));
    assert!(!logs.contains("ERROR"));
    assert!(rig.log().is_empty());
}

#[test]
fn wait_only_lets_time_pass() {
    let mut rig = Rig::new(Default::default(), Position::new(0.5, 0.5));

    rig.execute(&mut Command::Wait(Wait::new(Duration::from_millis(750))));

    assert_eq!(rig.game.now(), Duration::from_millis(750));
    assert!(rig.log().is_empty());
}

#[test]
fn buff_respects_both_cooldowns() {
    let mut rig = Rig::new(Default::default(), Position::new(0.5, 0.5));
    let mut command = Command::Buff(Buff::new());

    rig.execute(&mut command);
    assert_eq!(rig.game.presses_of(keys::HAKU), 1);
    for key in keys::BUFFS {
        assert_eq!(rig.game.presses_of(key), 1);
    }

    rig.execute(&mut command);
    assert_eq!(rig.game.presses_of(keys::HAKU), 1);
    assert_eq!(rig.game.presses_of(Key::F(1)), 1);

    rig.game.sleep(Duration::from_secs(181));
    rig.execute(&mut command);
    assert_eq!(rig.game.presses_of(keys::HAKU), 1);
    assert_eq!(rig.game.presses_of(Key::F(1)), 2);

    rig.game.sleep(Duration::from_secs(310));
    rig.execute(&mut command);
    assert_eq!(rig.game.presses_of(keys::HAKU), 2);
    assert_eq!(rig.game.presses_of(Key::F(4)), 3);
}

#[test]
fn shikigami_attacks_while_facing_the_direction() {
    let mut rig = Rig::new(Default::default(), Position::new(0.5, 0.5));
    let mut command = Command::Shikigami(Shikigami::new(Direction::Left, 3, 2).expect("valid"));

    rig.execute(&mut command);

    assert_eq!(
        rig.log(),
        vec![
            KeyEvent::Down(Key::Left),
            KeyEvent::Press {
                key: keys::SHIKIGAMI,
                count: 3
            },
            KeyEvent::Press {
                key: keys::SHIKIGAMI,
                count: 3
            },
            KeyEvent::Up(Key::Left),
        ]
    );
}

#[test]
fn yaksha_faces_the_map_centre_by_default() {
    let mut rig = Rig::new(Default::default(), Position::new(0.7, 0.5));

    rig.execute(&mut Command::Yaksha(Yaksha::new(None).expect("valid")));

    assert_eq!(
        rig.log(),
        vec![
            KeyEvent::Press {
                key: Key::Left,
                count: 1
            },
            KeyEvent::Press {
                key: keys::YAKSHA,
                count: 3
            },
        ]
    );
}

#[test]
fn fixed_skills_press_their_bindings() {
    let mut rig = Rig::new(Default::default(), Position::new(0.5, 0.5));
    let skills = [
        (Command::Tengu, keys::TENGU, 1),
        (Command::Kishin, keys::KISHIN, 4),
        (Command::NineTails, keys::NINE_TAILS, 3),
        (Command::Exorcist, keys::EXORCIST, 1),
        (Command::Domain, keys::DOMAIN, 3),
        (Command::Legion, keys::LEGION, 2),
    ];

    for (mut command, key, count) in skills {
        rig.execute(&mut command);
        assert_eq!(
            rig.log().last(),
            Some(&KeyEvent::Press { key, count }),
            "{} pressed the wrong key",
            command.name()
        );
    }
}
