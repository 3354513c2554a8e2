/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

/// Color for a tracker pid in `status`: green when alive, red otherwise.
pub fn color_for_liveness(alive: bool) -> &'static str {
    if alive { GREEN } else { RED }
}

/// Color an audit-log operation name.
pub fn color_for_operation(op: &str) -> &'static str {
    match op {
        "start" => GREEN,
        "stop" => YELLOW,
        "cleanup" => CYAN,
        "migration_applied" | "init" => MAGENTA,
        _ => RESET,
    }
}
