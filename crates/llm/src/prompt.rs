use sarathi_core::LanguageTag;

/// Canonical spellings the classifier must use when correcting native text.
pub const GLOSSARY: &[&str] = &[
    "WhatsApp / വാട്‌സാപ്പ് / व्हाट्सएप",
    "GPay / Google Pay / ഗൂഗിൾ പേ / गूगल पे",
    "DigiLocker / ഡിജിലോക്കർ / डिजिलॉकर",
    "Aadhaar / ആധാർ / आधार",
    "UPI / യുപിഐ / यूपीआई",
];

pub fn classifier_prompt(
    english_text: &str,
    native_text: &str,
    options: &[String],
    language: &LanguageTag,
) -> String {
    let language = language.name();
    let glossary = GLOSSARY
        .iter()
        .map(|entry| format!("- {entry}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an intent classification engine for a help app.

Context:
- The user is speaking in: {language}
- "Native Input" is the raw transcription.
- "English Input" is its machine translation.

Inputs:
1. English Input: "{english_text}"
2. Native Input: "{native_text}"

Available Topics:
[{topics}]

Glossary of correct spellings (use these exactly):
{glossary}

Task:
1. Pick the best matching topic from the list, copied exactly. If nothing matches, use "NONE".
2. Correct the spelling and grammar of the Native Input into standard colloquial {language}.

Return ONLY a JSON object with this structure:
{{"match": "Exact Topic Name or NONE", "correctedNative": "The corrected native sentence"}}"#,
        topics = options.join(", "),
    )
}

pub fn translation_prompt(text: &str, source_hint: &str, target: &LanguageTag) -> String {
    let source_line = if source_hint.eq_ignore_ascii_case("auto") {
        "Detect the source language automatically.".to_string()
    } else {
        format!("The source language is {source_hint}.")
    };

    format!(
        r#"You are a professional translator.
Translate the following text to {target}. {source_line}

Rules:
1. Keep the original meaning and tone.
2. If the text is already in {target}, return it with only spelling and grammar fixed.
3. Return ONLY the translated text, no explanations or extra characters.
4. Keep technical terms like "WhatsApp", "GPay", "UPI" or use their standard local script spelling.

Text to translate:
"{text}""#,
        target = target.name(),
    )
}
