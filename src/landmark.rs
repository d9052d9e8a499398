use std::fmt;

/// Every reference image the games look for. Each one is loaded from
/// `<images>/<name>.png`.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(enum_iterator::Sequence))]
pub enum Landmark {
    Start,
    Stage,
    SelectTitle,
    Select,
    End,
    Homerun,
    Hit,
    Foul,
    Strike,
    Restart,
    LeftTop,
    Coin,
    Title,
    GameOver,
    Levelup,
    Level,
}

impl Landmark {
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::Start => "start",
            Landmark::Stage => "stage",
            Landmark::SelectTitle => "select_title",
            Landmark::Select => "select",
            Landmark::End => "end",
            Landmark::Homerun => "homerun",
            Landmark::Hit => "hit",
            Landmark::Foul => "foul",
            Landmark::Strike => "strike",
            Landmark::Restart => "restart",
            Landmark::LeftTop => "left_top",
            Landmark::Coin => "coin",
            Landmark::Title => "title",
            Landmark::GameOver => "game_over",
            Landmark::Levelup => "levelup",
            Landmark::Level => "level",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.name())
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
