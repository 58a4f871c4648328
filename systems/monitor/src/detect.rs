//! Frame checks that do not depend on monitor state.

use maple_bot_core::{ColorRange, Image, Matcher, Position, Template};

/// Luma below which a pixel counts as black.
pub(crate) const BLACK_LUMA: u8 = 15;

/// Hue, saturation and value bounds of the rune marker.
pub const RUNE_RANGES: [ColorRange; 1] = [ColorRange::new([141, 148, 245], [146, 158, 255])];

/// Hue, saturation and value bounds of other players' markers.
pub const OTHER_RANGES: [ColorRange; 1] = [ColorRange::new([0, 245, 215], [10, 255, 255])];

/// Counts of player markers found on the minimap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PlayerCounts {
    pub(crate) others: usize,
    pub(crate) guild: usize,
}

impl PlayerCounts {
    pub(crate) const fn any(self) -> bool {
        self.others > 0 || self.guild > 0
    }
}

pub(crate) fn is_black_frame(frame: &Image, black_fraction: f64) -> bool {
    frame.dark_fraction(BLACK_LUMA) > black_fraction
}

/// Whether the dialog prompt is showing in its fixed region of the frame.
pub(crate) fn has_dialog(matcher: &dyn Matcher, frame: &Image, threshold: f32) -> bool {
    let region = frame.crop(400..550, 450..550);
    !matcher
        .multi_match(&region, Template::Dialog, threshold)
        .is_empty()
}

pub(crate) fn count_players(matcher: &dyn Matcher, minimap: &Image, threshold: f32) -> PlayerCounts {
    let filtered = minimap.filter_color(&OTHER_RANGES);
    PlayerCounts {
        others: matcher
            .multi_match(&filtered, Template::OtherPlayer, threshold)
            .len(),
        guild: matcher
            .multi_match(&filtered, Template::GuildMember, threshold)
            .len(),
    }
}

/// Normalised minimap position of the first rune marker, if any.
pub(crate) fn find_rune(matcher: &dyn Matcher, minimap: &Image, threshold: f32) -> Option<Position> {
    let filtered = minimap.filter_color(&RUNE_RANGES);
    matcher
        .multi_match(&filtered, Template::Rune, threshold)
        .first()
        .map(|found| minimap.relative(found.x, found.y))
}

/// Waypoint nearest to `target`.
pub(crate) fn closest(waypoints: &[Position], target: Position) -> Option<Position> {
    waypoints
        .iter()
        .copied()
        .min_by(|a, b| a.distance(target).total_cmp(&b.distance(target)))
}
