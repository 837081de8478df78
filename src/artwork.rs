use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const FALLBACK_GLYPH: &str = "\u{266B}";
const GRADIENT_START: &str = "#6c5ce7";
const GRADIENT_END: &str = "#00d4ff";

/// Up to two uppercase initials taken from the first two space separated
/// words of `title`, or a note glyph when none are available.
pub fn initials(title: &str) -> String {
    let letters: String = title
        .split(' ')
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        String::from(FALLBACK_GLYPH)
    } else {
        letters
    }
}

/// Square gradient SVG carrying the title's initials, as a data URL.
pub fn placeholder_art(title: &str) -> String {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='800' height='800'>\
<defs><linearGradient id='g' x1='0' x2='1'>\
<stop offset='0' stop-color='{GRADIENT_START}'/>\
<stop offset='1' stop-color='{GRADIENT_END}'/>\
</linearGradient></defs>\
<rect width='100%' height='100%' fill='url(#g)'/>\
<text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle' font-size='240' \
font-family='Inter, sans-serif' fill='rgba(255,255,255,0.95)'>{}</text></svg>",
        escape_xml(&initials(title))
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(url: &str) -> String {
        let payload = url
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("data url prefix");
        let bytes = STANDARD.decode(payload).expect("valid base64");
        String::from_utf8(bytes).expect("utf8 svg")
    }

    #[test]
    fn initials_use_first_two_words() {
        assert_eq!(initials("Manase Theeyaga"), "MT");
        assert_eq!(initials("inthandham"), "I");
        assert_eq!(initials("one two three"), "OT");
    }

    #[test]
    fn blank_title_falls_back_to_glyph() {
        assert_eq!(initials(""), FALLBACK_GLYPH);
    }

    #[test]
    fn placeholder_embeds_escaped_initials() {
        let svg = decode(&placeholder_art("& friends"));
        assert!(svg.contains(">&amp;F</text>"));
        assert!(svg.contains(GRADIENT_START));
        assert!(svg.contains(GRADIENT_END));
    }
}
