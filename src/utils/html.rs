// src/utils/html.rs

/// Sanitizes free text a grader attaches to a rubric criterion.
///
/// Notes are rendered back into the grading UI, so anything beyond basic
/// formatting tags is stripped. `<script>` and `<style>` lose their content too.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_formatting_and_drops_scripts() {
        assert_eq!(clean_html("<b>Strong</b> opening"), "<b>Strong</b> opening");
        assert_eq!(clean_html("ok<script>alert(1)</script>"), "ok");
        assert!(!clean_html("<p onclick=\"steal()\">see</p>").contains("onclick"));
    }
}
