//! Per-language extraction rules
//!
//! Which syntax-tree node kinds count as definitions, loops,
//! conditionals and calls is a data table keyed by language. Adding a
//! language is a data change here, not a new type.

use crate::features::detection::Language;

/// Grammar node-kind sets driving the extractor
pub struct ExtractionRules {
    /// Node kinds that open a callable unit
    pub definition_kinds: &'static [&'static str],
    /// Definition kinds with no name of their own (lambdas, function
    /// expressions not bound through a declarator)
    pub anonymous_kinds: &'static [&'static str],
    pub loop_kinds: &'static [&'static str],
    pub conditional_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    /// Branch kinds counted for the complexity estimate
    pub branch_kinds: &'static [&'static str],
}

static PYTHON_RULES: ExtractionRules = ExtractionRules {
    definition_kinds: &["function_definition", "lambda"],
    anonymous_kinds: &["lambda"],
    loop_kinds: &["for_statement", "while_statement"],
    conditional_kinds: &["if_statement", "conditional_expression"],
    call_kinds: &["call"],
    branch_kinds: &[
        "if_statement",
        "elif_clause",
        "for_statement",
        "while_statement",
        "conditional_expression",
        "boolean_operator",
        "except_clause",
    ],
};

static JAVASCRIPT_RULES: ExtractionRules = ExtractionRules {
    definition_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
        "arrow_function",
        // The grammar renamed this kind across versions; match both
        "function_expression",
        "function",
    ],
    anonymous_kinds: &["arrow_function", "function_expression", "function"],
    loop_kinds: &["for_statement", "for_in_statement", "while_statement", "do_statement"],
    conditional_kinds: &["if_statement", "ternary_expression", "switch_statement"],
    call_kinds: &["call_expression"],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
        "ternary_expression",
        "switch_case",
        "catch_clause",
    ],
};

static C_RULES: ExtractionRules = ExtractionRules {
    definition_kinds: &["function_definition"],
    anonymous_kinds: &[],
    loop_kinds: &["for_statement", "while_statement", "do_statement"],
    conditional_kinds: &["if_statement", "conditional_expression", "switch_statement"],
    call_kinds: &["call_expression"],
    branch_kinds: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "do_statement",
        "conditional_expression",
        "case_statement",
    ],
};

/// Rules lookup; Unknown has no grammar and takes the generic path
pub fn rules_for(language: Language) -> Option<&'static ExtractionRules> {
    match language {
        Language::Python => Some(&PYTHON_RULES),
        Language::JavaScript => Some(&JAVASCRIPT_RULES),
        Language::C => Some(&C_RULES),
        Language::Unknown => None,
    }
}

/// Call names too generic to be useful as flow context
pub fn is_builtin_call(name: &str) -> bool {
    matches!(
        name,
        "print"
            | "len"
            | "range"
            | "str"
            | "int"
            | "float"
            | "isinstance"
            | "printf"
            | "malloc"
            | "free"
            | "sizeof"
            | "require"
            | "console.log"
            | "console.error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_per_language() {
        assert!(rules_for(Language::Python)
            .unwrap()
            .definition_kinds
            .contains(&"function_definition"));
        assert!(rules_for(Language::JavaScript)
            .unwrap()
            .definition_kinds
            .contains(&"arrow_function"));
        assert!(rules_for(Language::Unknown).is_none());
    }

    #[test]
    fn test_builtin_filter() {
        assert!(is_builtin_call("print"));
        assert!(is_builtin_call("console.log"));
        assert!(!is_builtin_call("fibonacci"));
    }
}
