//! Outbound-name sanitization.
//!
//! Alexa rejects discovery responses whose friendly names contain markup,
//! so every host-provided name is stripped before it leaves the bridge.

/// Remove HTML tags and stray angle brackets from `input`.
///
/// The result never contains `<` or `>`. An unterminated tag swallows the
/// rest of the string.
#[must_use]
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_pass_plain_text_through() {
        assert_eq!(strip_html("Kitchen Lamp"), "Kitchen Lamp");
    }

    #[test]
    fn should_strip_simple_tags() {
        assert_eq!(strip_html("<b>Kitchen</b> Lamp"), "Kitchen Lamp");
    }

    #[test]
    fn should_strip_tags_with_attributes() {
        assert_eq!(
            strip_html("<span class=\"x\">Desk</span> Light"),
            "Desk Light"
        );
    }

    #[test]
    fn should_drop_stray_angle_brackets() {
        assert_eq!(strip_html("a < b > c"), "a  c");
        assert!(!strip_html("1 > 0").contains('>'));
    }

    #[test]
    fn should_swallow_unterminated_tag() {
        assert_eq!(strip_html("Lamp<script"), "Lamp");
    }

    #[test]
    fn should_never_emit_angle_brackets() {
        for input in ["<<>>", "<a<b>c>", "x<y", "plain"] {
            let out = strip_html(input);
            assert!(!out.contains('<'), "{input:?} -> {out:?}");
            assert!(!out.contains('>'), "{input:?} -> {out:?}");
        }
    }
}
