//! Key bindings and scoped key holds.

use maple_bot_core::{Key, KeyInput};

/// Jump.
pub const JUMP: Key = Key::Space;
/// Teleport skill.
pub const TELEPORT: Key = Key::Char('e');
/// Shikigami Haunting.
pub const SHIKIGAMI: Key = Key::Char('r');
/// Tengu Strike.
pub const TENGU: Key = Key::Char('q');
/// Ghost Yaksha Boss.
pub const YAKSHA: Key = Key::Char('2');
/// Kishin Shoukan.
pub const KISHIN: Key = Key::LeftShift;
/// Nine-Tailed Fury.
pub const NINE_TAILS: Key = Key::Char('3');
/// Exorcist's Charm.
pub const EXORCIST: Key = Key::Char('w');
/// Spirit's Domain.
pub const DOMAIN: Key = Key::Char('v');
/// Great Oni Lord's Legion.
pub const LEGION: Key = Key::Char('z');
/// Haku Reborn, the long-cooldown primary buff.
pub const HAKU: Key = Key::Ctrl;
/// Secondary buffs fired as a group.
pub const BUFFS: [Key; 3] = [Key::F(1), Key::F(2), Key::F(4)];

/// Key held for as long as the guard lives.
///
/// The key is released on drop, so every exit path (including cancellation)
/// leaves the keyboard clean.
pub(crate) struct HeldKey<'a> {
    keys: &'a dyn KeyInput,
    key: Key,
}

impl<'a> HeldKey<'a> {
    pub(crate) fn hold(keys: &'a dyn KeyInput, key: Key) -> Self {
        keys.key_down(key);
        Self { keys, key }
    }
}

impl Drop for HeldKey<'_> {
    fn drop(&mut self) {
        self.keys.key_up(self.key);
    }
}
