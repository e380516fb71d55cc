// Level progression across consecutive races.

use super::types::RaceOutcome;

pub const MAX_LEVEL: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceProgress {
    /// The player won and another level is unlocked.
    LevelComplete { next_level: u32 },
    /// The player won the final level.
    Champion,
    /// A bot won or the player was knocked out; the next race starts over at level 1.
    GameOver,
}

pub fn progress(level: u32, outcome: &RaceOutcome) -> RaceProgress {
    if !outcome.human_won() {
        return RaceProgress::GameOver;
    }
    if level < MAX_LEVEL {
        RaceProgress::LevelComplete {
            next_level: level + 1,
        }
    } else {
        RaceProgress::Champion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerKind;

    fn won(name: &str, kind: PlayerKind) -> RaceOutcome {
        RaceOutcome::Won {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn human_wins_unlock_the_next_level_until_the_last() {
        let you = won("You", PlayerKind::Human);
        assert_eq!(progress(1, &you), RaceProgress::LevelComplete { next_level: 2 });
        assert_eq!(progress(2, &you), RaceProgress::LevelComplete { next_level: 3 });
        assert_eq!(progress(3, &you), RaceProgress::Champion);
    }

    #[test]
    fn bot_wins_and_knockouts_end_the_run() {
        assert_eq!(progress(1, &won("Bot Alice", PlayerKind::Bot)), RaceProgress::GameOver);
        let knocked_out = RaceOutcome::HumanLost {
            reason: "You hit the garbage!".to_string(),
        };
        assert_eq!(knocked_out.winner_name(), "You hit the garbage!");
        assert_eq!(progress(1, &knocked_out), RaceProgress::GameOver);
    }
}
