// src/analyzer/markers.rs — Textual markers shared by analysis and layer gates

use regex::Regex;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s+\S").expect("valid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•]\s+\S").expect("valid regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d{1,3}[.)]\s+\S").expect("valid regex"));
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*```").expect("valid regex"));

static EXAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:examples?|e\.g\.|for instance|sample (?:input|output)|input:|output:)")
        .expect("valid regex")
});
static CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:must|should|required?|avoid|do not|don't|never|always|limit(?:ed)?|constraints?|ensure|only|at most|at least|maximum|minimum)\b",
    )
    .expect("valid regex")
});
static SUCCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:success(?:ful)?|criteria|criterion|measur(?:e|able)|metrics?|verif(?:y|ied)|validat(?:e|ion)|acceptance)\b",
    )
    .expect("valid regex")
});
static CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:context|background|audience|purpose|goals?|assum(?:e|ption)s?|scenario|situation)\b",
    )
    .expect("valid regex")
});
static TECHNICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:api|algorithm|architecture|latency|throughput|schema|kubernetes|compiler|async|concurrency|database|protocol|optimi[sz]ation|framework|deployment|regression)\b",
    )
    .expect("valid regex")
});

pub fn header_count(text: &str) -> usize {
    HEADER.find_iter(text).count()
}

pub fn bullet_count(text: &str) -> usize {
    BULLET.find_iter(text).count()
}

pub fn numbered_count(text: &str) -> usize {
    NUMBERED.find_iter(text).count()
}

/// Header, bullet and numbered lines together.
pub fn structural_count(text: &str) -> usize {
    header_count(text) + bullet_count(text) + numbered_count(text)
}

/// Fenced code blocks (pairs of fence lines, an unclosed fence counts).
pub fn code_block_count(text: &str) -> usize {
    CODE_FENCE.find_iter(text).count().div_ceil(2)
}

pub fn example_count(text: &str) -> usize {
    EXAMPLE.find_iter(text).count()
}

pub fn constraint_count(text: &str) -> usize {
    CONSTRAINT.find_iter(text).count()
}

pub fn success_count(text: &str) -> usize {
    SUCCESS.find_iter(text).count()
}

pub fn context_count(text: &str) -> usize {
    CONTEXT.find_iter(text).count()
}

pub fn technical_count(text: &str) -> usize {
    TECHNICAL.find_iter(text).count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
