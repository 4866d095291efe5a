//! Transpiler integration tests: AST to prompt text.

use incant_core::{
    parse, render, resolve, transpile, ActionTemplates, AliasTable, Bindings, Error,
    TranspileError,
};

fn prompt(src: &str) -> String {
    render(src, &Bindings::new()).unwrap().0
}

#[test]
fn simple_write() {
    assert_eq!(prompt("write \"hello\""), "Write hello.");
}

#[test]
fn must_modifiers_expand_in_insertion_order() {
    assert_eq!(
        prompt("write \"email\" !professional !short"),
        "Write email. Maintain a professional tone. Keep it concise and brief."
    );
}

#[test]
fn under_n_modifier_becomes_a_character_limit() {
    assert_eq!(
        prompt("write \"bio\" !under_100"),
        "Write bio. Keep it under 100 characters."
    );
}

#[test]
fn bare_under_modifier_falls_back_to_generic_must() {
    assert_eq!(prompt("write \"bio\" !under_"), "Write bio. Must be under_.");
}

#[test]
fn repeated_must_modifier_expands_exactly_once() {
    let text = prompt("write \"email\" !short !short !short");
    assert_eq!(text.matches("Keep it concise and brief.").count(), 1);
}

#[test]
fn clause_order_is_base_specifier_must_priority_avoid() {
    let text = prompt("review \"the patch\" [diff] !honest ^security _jargon");
    let base = text.find("Review this code: the patch.").unwrap();
    let spec = text.find("Format: diff.").unwrap();
    let must = text.find("Be honest and direct.").unwrap();
    let priority = text.find("Focus on security.").unwrap();
    let avoid = text.find("Avoid jargon.").unwrap();
    assert!(base < spec && spec < must && must < priority && priority < avoid);
}

#[test]
fn nice_clause_gets_an_if_possible_lead_in() {
    assert_eq!(
        prompt("write \"email\" ~short"),
        "Write email. If possible, keep it concise and brief."
    );
}

#[test]
fn code_specifier_uses_language_phrasing() {
    assert_eq!(
        prompt("code \"merge sort\" [rust]"),
        "Write code for merge sort. Use rust."
    );
}

#[test]
fn translate_specifier_names_the_target() {
    let text = prompt("translate \"hello\" [french]");
    assert!(text.contains("Translate to french."), "{}", text);
}

#[test]
fn numeric_specifier_becomes_an_item_count() {
    let text = prompt("list \"ideas\" [10]");
    assert!(text.contains("Provide 10 items."), "{}", text);
}

#[test]
fn unknown_action_falls_back_to_the_generic_sentence() {
    assert_eq!(
        prompt("frobnicate \"the widget\""),
        "Do the following regarding frobnicate: the widget."
    );
}

#[test]
fn unknown_modifier_gets_a_generic_clause() {
    let text = prompt("write \"x\" !frobnicate");
    assert!(text.contains("Must be frobnicate."), "{}", text);
}

#[test]
fn unknown_avoid_modifier_gets_do_not() {
    let text = prompt("write \"x\" _hedging");
    assert!(text.contains("Do not hedging."), "{}", text);
}

#[test]
fn chain_inserts_one_connector_per_link() {
    let text = prompt("write \"text\" > translate [es] > format [json]");
    assert_eq!(text.matches("After that, ").count(), 2);
    assert!(text.starts_with("Write text."), "{}", text);
}

#[test]
fn parallel_siblings_join_with_also() {
    assert_eq!(
        prompt("title \"post\" & summarize \"post\""),
        "Generate a title for post. Also, summarize post."
    );
}

#[test]
fn iteration_wraps_the_whole_instruction() {
    assert_eq!(
        prompt("translate \"hello\" * [fr, es]"),
        "For each of: fr, es: Translate hello."
    );
}

#[test]
fn persona_prefixes_the_entire_output() {
    let mut bindings = Bindings::new();
    bindings.insert("code".to_string(), "fn main() {}".to_string());
    let (text, _) = render("@as \"expert\" { review {code} }", &bindings).unwrap();
    assert_eq!(text, "Acting as expert: Review this code: fn main() {}.");
}

#[test]
fn placeholder_subject_substitutes_from_bindings() {
    let mut bindings = Bindings::new();
    bindings.insert("article".to_string(), "My long article text".to_string());
    let (text, _) = render("summarize {article}", &bindings).unwrap();
    assert_eq!(text, "Summarize My long article text.");
}

#[test]
fn placeholder_inside_a_literal_subject_substitutes_too() {
    let mut bindings = Bindings::new();
    bindings.insert("name".to_string(), "Ada".to_string());
    let (text, _) = render("write \"a note to {name}\"", &bindings).unwrap();
    assert_eq!(text, "Write a note to Ada.");
}

#[test]
fn unbound_placeholder_aborts_with_no_partial_output() {
    let err = render("summarize {article}", &Bindings::new()).unwrap_err();
    match err {
        Error::Transpile(TranspileError::UnboundPlaceholder { name }) => {
            assert_eq!(name, "article");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn output_is_deterministic() {
    let src = "code \"merge sort\" [rust] !typed !tested ^performance > docs \"the result\"";
    assert_eq!(prompt(src), prompt(src));
}

#[test]
fn transpile_uses_injected_tables() {
    let mut program = parse("write \"x\" !punchy").unwrap();
    let mut aliases = AliasTable::builtin();
    aliases
        .must
        .insert("punchy".to_string(), "Make every sentence land.".to_string());
    resolve(&mut program, &aliases);
    let text = transpile(
        &program,
        &aliases,
        &ActionTemplates::builtin(),
        &Bindings::new(),
    )
    .unwrap();
    assert!(text.contains("Make every sentence land."), "{}", text);
}

#[test]
fn complex_code_generation_example() {
    let text = prompt("code \"merge sort\" [rust] !typed !tested ^performance");
    assert_eq!(
        text,
        "Write code for merge sort. Use rust. Include type annotations. \
         Include unit tests. Prioritize performance."
    );
}

#[test]
fn complex_image_example() {
    let text = prompt("img \"sunset\" !photo ^cinematic _text");
    assert_eq!(
        text,
        "Generate an image of sunset. Make it photorealistic. \
         Use cinematic composition and lighting. Do not include text in the image."
    );
}

#[test]
fn alias_table_loads_from_json() {
    let table = AliasTable::from_json(
        r#"{"aliases": {"punchy": "short"}, "must": {"short": "Keep it short."}}"#,
    )
    .unwrap();
    assert_eq!(table.canonical("punchy"), "short");
    let mut program = parse("write \"x\" !punchy").unwrap();
    resolve(&mut program, &table);
    let text = transpile(
        &program,
        &table,
        &ActionTemplates::builtin(),
        &Bindings::new(),
    )
    .unwrap();
    assert!(text.contains("Keep it short."), "{}", text);
}

#[test]
fn malformed_alias_table_is_a_load_error() {
    let err = AliasTable::from_json("{not json").unwrap_err();
    assert!(err.to_string().contains("alias table"), "{}", err);
}
