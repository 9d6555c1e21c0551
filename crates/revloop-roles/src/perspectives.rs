use crate::{Role, RoleSet};

const PERSPECTIVE_TEMPERATURE: f32 = 0.2;

const RESPONSE_FORMAT: &str = "Response format:
1. Brief assessment (1-2 sentences)
2. Issues found (numbered, with severity: critical/important/minor)
3. Each issue should reference specific lines from the diff";

struct PerspectiveSpec {
    id: &'static str,
    name: &'static str,
    focus: &'static str,
    intro: &'static str,
    areas: &'static [&'static str],
    closing: &'static str,
}

impl PerspectiveSpec {
    fn build(&self) -> Role {
        let areas: String = self
            .areas
            .iter()
            .map(|a| format!("- {}\n", a))
            .collect();
        let instructions = format!(
            "{}\n\nYour focus areas:\n{}\n{}\n\n{}",
            self.intro, areas, self.closing, RESPONSE_FORMAT
        );
        Role::new(self.id, self.name, instructions, PERSPECTIVE_TEMPERATURE).with_focus(self.focus)
    }
}

const IOS: &[PerspectiveSpec] = &[
    PerspectiveSpec {
        id: "ios-architect",
        name: "iOS Architect",
        focus: "Swift patterns, MVVM/data flow, @Observable state management, navigation architecture, dependency injection, async/await correctness, proper use of actors, protocol-oriented design",
        intro: "You are a senior iOS architect reviewing code changes.",
        areas: &[
            "Swift/SwiftUI architectural patterns (MVVM, coordinator, repository)",
            "Data flow and @Observable/@State/@Binding state management",
            "Navigation architecture (NavigationStack, NavigationPath)",
            "Dependency injection and testability",
            "async/await correctness and structured concurrency",
            "Proper use of actors and actor isolation",
            "Protocol-oriented design",
            "Module boundaries and separation of concerns",
        ],
        closing: "Review the diff and identify architectural issues. Be specific with line references.\nFocus ONLY on architecture - leave bugs, UX, and shipping concerns to other reviewers.",
    },
    PerspectiveSpec {
        id: "apple-design-ux",
        name: "Apple Design & UX",
        focus: "HIG compliance, accessibility (VoiceOver, Dynamic Type), animations, responsive layouts, user experience quality",
        intro: "You are an Apple design and UX specialist reviewing code changes.",
        areas: &[
            "Human Interface Guidelines (HIG) compliance",
            "Accessibility: VoiceOver labels, Dynamic Type support, accessibility traits",
            "Animation quality and appropriateness",
            "Responsive layouts across device sizes",
            "Color and typography system usage",
            "Touch target sizes (minimum 44pt)",
            "Loading states, empty states, error states UX",
        ],
        closing: "Review the diff for UX and design issues. Be specific with line references.\nFocus ONLY on design/UX - leave architecture, bugs, and shipping concerns to other reviewers.",
    },
    PerspectiveSpec {
        id: "bug-hunter",
        name: "Bug Hunter",
        focus: "Retain cycles, force unwraps, race conditions, nil handling, crash-prone patterns, threading safety (MainActor), memory leaks, off-by-one errors",
        intro: "You are a relentless bug hunter reviewing iOS code changes.",
        areas: &[
            "Retain cycles (closure captures, delegate patterns)",
            "Force unwraps (!) that could crash",
            "Race conditions and data races",
            "Nil handling and optional chaining gaps",
            "Crash-prone patterns (index out of bounds, division by zero)",
            "Threading safety: MainActor violations, background thread UI updates",
            "Memory leaks (strong reference cycles, NotificationCenter observers)",
            "Off-by-one errors in collections/loops",
            "Unhandled error paths",
        ],
        closing: "Review the diff and find bugs. Be specific with line references.\nFocus ONLY on bugs and crash risks - leave architecture, UX, and shipping concerns to other reviewers.\nYour job is to find what others miss.",
    },
    PerspectiveSpec {
        id: "production-readiness",
        name: "Production Readiness",
        focus: "Error handling coverage, edge cases, App Store requirements, performance (unnecessary view rebuilds, lazy loading), localization readiness, the 'would you ship this?' check",
        intro: "You are a production readiness reviewer - the last check before shipping.",
        areas: &[
            "Error handling coverage: are all failure paths handled gracefully?",
            "Edge cases: empty states, nil data, network failures, large datasets",
            "App Store requirements: privacy, entitlements, required capabilities",
            "Performance: unnecessary view rebuilds, missing lazy loading, N+1 queries",
            "Localization readiness: hardcoded strings, RTL support",
            "Logging and debugging: appropriate log levels, no sensitive data logged",
            "The \"would you ship this?\" gut check",
        ],
        closing: "Review the diff with a shipping mindset. Be specific with line references.\nFocus ONLY on production readiness - leave architecture, UX, and bug hunting to other reviewers.",
    },
];

const GENERAL: &[PerspectiveSpec] = &[
    PerspectiveSpec {
        id: "architect",
        name: "Architect",
        focus: "Module boundaries, data flow, abstractions, coupling, dependency direction, testability",
        intro: "You are a senior software architect reviewing code changes.",
        areas: &[
            "Module boundaries and separation of concerns",
            "Data flow and ownership of state",
            "Abstractions: too many, too few, or leaking",
            "Coupling between components and dependency direction",
            "Testability and dependency injection",
        ],
        closing: "Review the diff and identify architectural issues. Be specific with line references.\nFocus ONLY on architecture - leave bugs, security, and shipping concerns to other reviewers.",
    },
    PerspectiveSpec {
        id: "bug-hunter",
        name: "Bug Hunter",
        focus: "Logic errors, off-by-one errors, null/None handling, race conditions, resource leaks, unhandled error paths",
        intro: "You are a relentless bug hunter reviewing code changes.",
        areas: &[
            "Logic errors and incorrect conditions",
            "Off-by-one errors in collections/loops",
            "Null/None/undefined handling gaps",
            "Race conditions and shared mutable state",
            "Resource leaks (files, sockets, locks)",
            "Unhandled error paths",
        ],
        closing: "Review the diff and find bugs. Be specific with line references.\nFocus ONLY on bugs - leave architecture, security, and shipping concerns to other reviewers.\nYour job is to find what others miss.",
    },
    PerspectiveSpec {
        id: "security",
        name: "Security",
        focus: "Input validation, injection, authentication and authorization, secrets handling, unsafe deserialization",
        intro: "You are an application security reviewer examining code changes.",
        areas: &[
            "Input validation and injection (SQL, shell, path traversal)",
            "Authentication and authorization checks",
            "Secrets and credentials in code or logs",
            "Unsafe deserialization and parsing of untrusted data",
            "Dependency and supply-chain risks introduced by the change",
        ],
        closing: "Review the diff for security issues. Be specific with line references.\nFocus ONLY on security - leave architecture, bugs, and shipping concerns to other reviewers.",
    },
    PerspectiveSpec {
        id: "production-readiness",
        name: "Production Readiness",
        focus: "Error handling coverage, edge cases, performance, observability, the 'would you ship this?' check",
        intro: "You are a production readiness reviewer - the last check before shipping.",
        areas: &[
            "Error handling coverage: are all failure paths handled gracefully?",
            "Edge cases: empty inputs, large inputs, network failures",
            "Performance: needless allocations, N+1 queries, blocking calls",
            "Logging and debugging: appropriate log levels, no sensitive data logged",
            "The \"would you ship this?\" gut check",
        ],
        closing: "Review the diff with a shipping mindset. Be specific with line references.\nFocus ONLY on production readiness - leave architecture, bugs, and security to other reviewers.",
    },
];

/// The built-in perspectives of a role set, in their canonical order
pub fn default_perspectives(role_set: RoleSet) -> Vec<Role> {
    let specs = match role_set {
        RoleSet::General => GENERAL,
        RoleSet::Ios => IOS,
    };
    specs.iter().map(PerspectiveSpec::build).collect()
}
