//! User-facing status lines. Regular output goes to stdout; warnings go to
//! stderr so they survive `clientclock stats > report.txt`.

use crate::utils::colors::{CYAN, GREEN, RESET, YELLOW};
use std::fmt;

const BOLD: &str = "\x1b[1m";

pub fn info<T: fmt::Display>(msg: T) {
    println!("{CYAN}{BOLD}→{RESET} {msg}");
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

pub fn warning<T: fmt::Display>(msg: T) {
    eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
}
