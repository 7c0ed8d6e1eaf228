//! Shared UI icons and emojis.
//!
//! Each icon has an ASCII fallback used when the terminal cannot render
//! emoji.

use console::Emoji;

// Outcome indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static ROLLBACK: Emoji<'_, '_> = Emoji("↩️  ", "[UNDO]");
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Board indicators
pub static BOARD: Emoji<'_, '_> = Emoji("📋 ", "");
pub static COLUMN: Emoji<'_, '_> = Emoji("● ", "* ");
pub static PERSON: Emoji<'_, '_> = Emoji("👤 ", "@");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
