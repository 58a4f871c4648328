use maple_bot_core::Position;
use maple_bot_system_commands::{Command, CommandError, Entry, Routine, RoutineError};

const SAMPLE: &str = "\
# opening loop
@, label=start
*, x=0.30, y=0.55, adjust=yes
    Shikigami, left, num_attacks=3   # hit the left side
    Tengu
*, 0.70, 0.55
    Yaksha

Buff
Goto, start
";

#[test]
fn parses_labels_points_and_commands() {
    let routine = Routine::parse(SAMPLE).expect("valid routine");

    assert_eq!(routine.len(), 5);
    assert_eq!(routine.labels().index_of("start"), Some(0));
    assert_eq!(
        routine.waypoints(),
        vec![Position::new(0.30, 0.55), Position::new(0.70, 0.55)]
    );

    let Entry::Point(first) = &routine.entries()[1] else {
        panic!("expected a point, got {:?}", routine.entries()[1]);
    };
    assert!(first.adjust());
    let names: Vec<_> = first.commands().iter().map(Command::name).collect();
    assert_eq!(names, ["Shikigami", "Tengu"]);

    assert!(matches!(&routine.entries()[3], Entry::Command(Command::Buff(_))));
    assert!(matches!(&routine.entries()[4], Entry::Command(Command::Goto(goto)) if goto.label() == "start"));
}

#[test]
fn validation_errors_carry_line_numbers() {
    let error = Routine::parse("Tengu\nMove, 0.5, abc\n").expect_err("invalid");
    assert!(matches!(
        error,
        RoutineError::Command {
            line: 2,
            source: CommandError::InvalidNumber { param: "y", .. },
        }
    ));

    let error = Routine::parse("\n\nDash, left").expect_err("invalid");
    assert_eq!(
        error,
        RoutineError::Command {
            line: 3,
            source: CommandError::UnknownCommand("Dash".to_owned()),
        }
    );

    let error = Routine::parse("*, x=0.1, y=0.2, adjust=maybe").expect_err("invalid");
    assert!(matches!(
        error,
        RoutineError::Command {
            line: 1,
            source: CommandError::InvalidBoolean { .. },
        }
    ));
}

#[test]
fn indented_commands_need_a_point() {
    assert_eq!(
        Routine::parse("Buff\n    Tengu\n"),
        Err(RoutineError::OrphanCommand { line: 2 })
    );
    assert_eq!(
        Routine::parse("  Tengu"),
        Err(RoutineError::OrphanCommand { line: 1 })
    );
}

#[test]
fn step_budgets_are_validated_when_parsing() {
    let error = Routine::parse("Adjust, 0.5, 0.5, max_steps=0").expect_err("invalid");
    assert!(matches!(
        error,
        RoutineError::Command {
            source: CommandError::NonPositiveSteps { .. },
            ..
        }
    ));
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let routine = Routine::parse("# nothing here\n\n   \n").expect("valid routine");
    assert!(routine.is_empty());
}
