//! `nssync describe`

use crate::ui;
use colored::Colorize;
use declarative::StateFlags;
use nameservice::{Platform, USER_STATES, USER_TYPE};

pub fn run() {
    let platform = Platform::global();

    ui::header(&format!("Resource type: {USER_TYPE}"));
    ui::kv("backend", &platform.family().to_string());
    ui::dim("Autogen states accept `:auto` and fall back to a platform default.");

    for state in &USER_STATES {
        ui::section(state.name);
        println!("  {}", state.description);
        ui::kv("flags", flags_label(state.flags));
        if state.field() != state.name {
            ui::kv("record field", state.field());
        }
        if state.generate.is_some() {
            ui::kv("default", &"generated when requested".dimmed().to_string());
        }
    }
}

fn flags_label(flags: StateFlags) -> &'static str {
    match (flags.autogen, flags.optional) {
        (true, true) => "autogen, optional",
        (true, false) => "autogen",
        (false, true) => "optional",
        (false, false) => "required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_label() {
        assert_eq!(flags_label(StateFlags::REQUIRED), "required");
        assert_eq!(flags_label(StateFlags::AUTOGEN), "autogen");
        assert_eq!(flags_label(StateFlags::OPTIONAL), "optional");
    }
}
