//! Syntax highlighting with ordered regex rule tables.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::util::{escape_html, replace_outside_tags};

/// Language families recognized by the highlighter.
///
/// Each family owns one rule table. Tags that do not map to a family are
/// rendered as escaped plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JsLike,
    CssLike,
    HtmlLike,
    PythonLike,
    Sql,
    Json,
    Plain,
}

impl Language {
    /// Classifies a fenced code block language tag.
    ///
    /// The tag is trimmed and lowercased before lookup, so `JS`, ` js ` and
    /// `js` all select the same table.
    ///
    /// # Examples
    ///
    /// ```
    /// use lessonmark::Language;
    ///
    /// assert_eq!(Language::from_tag("TypeScript"), Language::JsLike);
    /// assert_eq!(Language::from_tag("brainfuck"), Language::Plain);
    /// ```
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" | "jsx" | "mjs" | "cjs" | "ts" | "typescript" | "tsx" => {
                Language::JsLike
            }
            "css" | "scss" | "sass" | "less" => Language::CssLike,
            "html" | "htm" | "xml" | "xhtml" | "svg" | "vue" => Language::HtmlLike,
            "py" | "python" | "python3" => Language::PythonLike,
            "sql" | "mysql" | "postgres" | "postgresql" | "sqlite" | "plsql" => Language::Sql,
            "json" | "jsonc" | "json5" => Language::Json,
            _ => Language::Plain,
        }
    }

    /// Returns the language family name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::JsLike => "javascript",
            Language::CssLike => "css",
            Language::HtmlLike => "html",
            Language::PythonLike => "python",
            Language::Sql => "sql",
            Language::Json => "json",
            Language::Plain => "plain",
        }
    }

    /// Ordered rule table for this language.
    fn rules(&self) -> &'static [Rule] {
        match self {
            Language::JsLike => &JS_RULES,
            Language::CssLike => &CSS_RULES,
            Language::HtmlLike => &HTML_RULES,
            Language::PythonLike => &PYTHON_RULES,
            Language::Sql => &SQL_RULES,
            Language::Json => &JSON_RULES,
            Language::Plain => &[],
        }
    }
}

/// HTML class names for syntax highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightClass {
    Comment,
    String,
    Number,
    Keyword,
    Builtin,
    Property,
    Attribute,
    Tag,
    Function,
}

impl HighlightClass {
    /// CSS class name for this highlight type.
    pub fn css_class(&self) -> &'static str {
        match self {
            HighlightClass::Comment => "hl-comment",
            HighlightClass::String => "hl-string",
            HighlightClass::Number => "hl-number",
            HighlightClass::Keyword => "hl-keyword",
            HighlightClass::Builtin => "hl-builtin",
            HighlightClass::Property => "hl-property",
            HighlightClass::Attribute => "hl-attr",
            HighlightClass::Tag => "hl-tag",
            HighlightClass::Function => "hl-function",
        }
    }
}

/// Single substitution in a rule table.
///
/// The pattern must define a `tok` group, which is wrapped in a span. The
/// optional `pre` and `post` groups are context that is matched and written
/// back unchanged.
struct Rule {
    pattern: Regex,
    class: HighlightClass,
}

impl Rule {
    fn new(pattern: &str, class: HighlightClass) -> Self {
        let pattern = Regex::new(pattern).expect("highlight pattern should compile");
        Self { pattern, class }
    }

    fn apply(&self, html: &str) -> String {
        let class = self.class.css_class();
        replace_outside_tags(html, &self.pattern, |caps: &Captures<'_>| {
            let group = |name: &str| caps.name(name).map_or("", |m| m.as_str());
            format!(
                "{}<span class=\"{}\">{}</span>{}",
                group("pre"),
                class,
                group("tok"),
                group("post")
            )
        })
    }
}

/// Builds a whole-word alternation pattern from a fixed word list.
fn words(list: &[&str]) -> String {
    format!(r"\b(?P<tok>{})\b", list.join("|"))
}

/// Same as [`words`] but matching case insensitively.
fn words_ci(list: &[&str]) -> String {
    format!(r"(?i)\b(?P<tok>{})\b", list.join("|"))
}

const BLOCK_COMMENT: &str = r"(?s)(?P<tok>/\*.*?\*/)";
const SLASH_COMMENT: &str = r"(?P<tok>//[^\n]*)";
const HASH_COMMENT: &str = r"(?P<tok>#[^\n]*)";
const DASH_COMMENT: &str = r"(?P<tok>--[^\n]*)";
const MARKUP_COMMENT: &str = r"(?s)(?P<tok>&lt;!--.*?--&gt;)";

const QUOTED: &str = r#"(?P<tok>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')"#;
const JS_STRING: &str = r#"(?P<tok>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\.)*`)"#;
const PY_STRING: &str =
    r#"(?s)(?P<tok>""".*?"""|'''.*?'''|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')"#;
const SQL_STRING: &str = r"(?P<tok>'(?:[^'\n]|'')*')";

const NUMBER: &str = r"\b(?P<tok>0[xX][0-9a-fA-F]+|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\b";
const CSS_NUMBER: &str = r"(?P<tok>#[0-9a-fA-F]{3,8}\b|-?\b\d+(?:\.\d+)?(?:px|rem|em|vh|vw|vmin|vmax|ch|pt|deg|ms|s|fr|%)?)";
const JSON_NUMBER: &str = r"(?P<tok>-?\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\b";

const FUNCTION_CALL: &str = r"\b(?P<tok>[A-Za-z_]\w*)(?P<post>\()";

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "export", "extends", "finally", "for", "from",
    "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "of", "return", "static", "super", "switch", "this", "throw", "try", "typeof", "var",
    "void", "while", "with", "yield",
];

const JS_BUILTINS: &[&str] = &[
    "Array", "Boolean", "Date", "Error", "Infinity", "JSON", "Map", "Math", "NaN", "Number",
    "Object", "Promise", "RegExp", "Set", "String", "Symbol", "console", "document", "false",
    "fetch", "module", "null", "require", "setInterval", "setTimeout", "true", "undefined",
    "window",
];

const CSS_KEYWORDS: &[&str] = &["auto", "inherit", "initial", "none", "unset"];

const CSS_BUILTINS: &[&str] = &[
    "calc", "clamp", "hsl", "hsla", "linear-gradient", "max", "min", "radial-gradient", "rgb",
    "rgba", "url", "var",
];

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const PY_BUILTINS: &[&str] = &[
    "abs", "bool", "cls", "dict", "enumerate", "filter", "float", "input", "int",
    "isinstance", "len", "list", "map", "max", "min", "open", "print", "range", "self", "set",
    "sorted", "str", "sum", "super", "tuple", "type", "zip",
];

const SQL_KEYWORDS: &[&str] = &[
    "add", "all", "alter", "and", "as", "asc", "between", "by", "case", "create", "delete",
    "desc", "distinct", "drop", "else", "end", "exists", "foreign", "from", "group", "having",
    "in", "index", "inner", "insert", "into", "is", "join", "key", "left", "like", "limit",
    "not", "null", "offset", "on", "or", "order", "outer", "primary", "references", "right",
    "select", "set", "table", "then", "union", "unique", "update", "values", "when", "where",
];

const SQL_BUILTINS: &[&str] = &[
    "avg", "cast", "coalesce", "concat", "count", "date", "ifnull", "length", "lower", "max",
    "min", "now", "nullif", "round", "substring", "sum", "upper",
];

const JSON_KEYWORDS: &[&str] = &["false", "null", "true"];

static JS_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(BLOCK_COMMENT, HighlightClass::Comment),
        Rule::new(SLASH_COMMENT, HighlightClass::Comment),
        Rule::new(JS_STRING, HighlightClass::String),
        Rule::new(NUMBER, HighlightClass::Number),
        Rule::new(&words(JS_KEYWORDS), HighlightClass::Keyword),
        Rule::new(&words(JS_BUILTINS), HighlightClass::Builtin),
        Rule::new(FUNCTION_CALL, HighlightClass::Function),
    ]
});

static CSS_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(BLOCK_COMMENT, HighlightClass::Comment),
        Rule::new(QUOTED, HighlightClass::String),
        Rule::new(CSS_NUMBER, HighlightClass::Number),
        Rule::new(r"(?P<tok>@[A-Za-z-]+|!important)", HighlightClass::Keyword),
        Rule::new(&words(CSS_KEYWORDS), HighlightClass::Keyword),
        Rule::new(&words(CSS_BUILTINS), HighlightClass::Builtin),
        Rule::new(
            r"(?P<tok>-?[A-Za-z][\w-]*)(?P<post>\s*:)",
            HighlightClass::Property,
        ),
        Rule::new(FUNCTION_CALL, HighlightClass::Function),
    ]
});

static HTML_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(MARKUP_COMMENT, HighlightClass::Comment),
        Rule::new(r"(?i)(?P<pre>&lt;)(?P<tok>!doctype)", HighlightClass::Keyword),
        Rule::new(QUOTED, HighlightClass::String),
        Rule::new(
            r"(?P<pre>&lt;/?)(?P<tok>[A-Za-z][\w:-]*)",
            HighlightClass::Tag,
        ),
        Rule::new(
            r"(?P<pre>\s)(?P<tok>[A-Za-z_:@][\w:.-]*)(?P<post>=)",
            HighlightClass::Attribute,
        ),
        Rule::new(FUNCTION_CALL, HighlightClass::Function),
    ]
});

static PYTHON_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(HASH_COMMENT, HighlightClass::Comment),
        Rule::new(PY_STRING, HighlightClass::String),
        Rule::new(NUMBER, HighlightClass::Number),
        Rule::new(&words(PY_KEYWORDS), HighlightClass::Keyword),
        Rule::new(&words(PY_BUILTINS), HighlightClass::Builtin),
        Rule::new(r"(?P<tok>@[A-Za-z_][\w.]*)", HighlightClass::Builtin),
        Rule::new(FUNCTION_CALL, HighlightClass::Function),
    ]
});

static SQL_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(BLOCK_COMMENT, HighlightClass::Comment),
        Rule::new(DASH_COMMENT, HighlightClass::Comment),
        Rule::new(SQL_STRING, HighlightClass::String),
        Rule::new(NUMBER, HighlightClass::Number),
        Rule::new(&words_ci(SQL_KEYWORDS), HighlightClass::Keyword),
        Rule::new(&words_ci(SQL_BUILTINS), HighlightClass::Builtin),
        Rule::new(FUNCTION_CALL, HighlightClass::Function),
    ]
});

static JSON_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Values first: a key is always followed by a colon, never by `,]}`
        Rule::new(
            r#"(?P<tok>"(?:[^"\\\n]|\\.)*")(?P<post>\s*(?:[,\]\}]|$))"#,
            HighlightClass::String,
        ),
        Rule::new(
            r#"(?P<tok>"(?:[^"\\\n]|\\.)*")(?P<post>\s*:)"#,
            HighlightClass::Property,
        ),
        Rule::new(JSON_NUMBER, HighlightClass::Number),
        Rule::new(&words(JSON_KEYWORDS), HighlightClass::Keyword),
    ]
});

/// Highlights source code with regex rule tables.
///
/// Escapes the code, then applies the rule table selected by the language
/// tag in order. Rules only rewrite text outside of spans emitted by
/// earlier rules, so markup stays well formed, but text already inside a
/// span can be wrapped again (a keyword inside a comment, for example).
///
/// # Arguments
///
/// * `code`: Raw source code
/// * `language`: Language tag from the code fence, possibly empty
///
/// # Returns
///
/// HTML string with `hl-*` spans. Unknown languages return escaped text.
///
/// # Examples
///
/// ```
/// use lessonmark::highlight;
///
/// let html = highlight("const x = 1; // one", "js");
/// assert!(html.contains("<span class=\"hl-keyword\">const</span>"));
/// assert!(html.contains("hl-comment"));
/// ```
pub fn highlight(code: &str, language: &str) -> String {
    let language = Language::from_tag(language);

    language
        .rules()
        .iter()
        .fold(escape_html(code), |html, rule| rule.apply(&html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection_js_family() {
        // Arrange & Act & Assert
        assert_eq!(Language::from_tag("js"), Language::JsLike);
        assert_eq!(Language::from_tag("JavaScript"), Language::JsLike);
        assert_eq!(Language::from_tag(" tsx "), Language::JsLike);
    }

    #[test]
    fn test_language_detection_other_families() {
        // Arrange & Act & Assert
        assert_eq!(Language::from_tag("scss"), Language::CssLike);
        assert_eq!(Language::from_tag("xml"), Language::HtmlLike);
        assert_eq!(Language::from_tag("py"), Language::PythonLike);
        assert_eq!(Language::from_tag("PostgreSQL"), Language::Sql);
        assert_eq!(Language::from_tag("json"), Language::Json);
    }

    #[test]
    fn test_language_detection_unsupported() {
        // Arrange & Act & Assert
        assert_eq!(Language::from_tag("rust"), Language::Plain);
        assert_eq!(Language::from_tag(""), Language::Plain);
    }

    #[test]
    fn test_highlight_js_keyword_and_comment() {
        // Arrange
        let code = "const x = 1; // one";

        // Act
        let html = highlight(code, "js");

        // Assert
        assert!(
            html.contains("<span class=\"hl-keyword\">const</span>"),
            "Should highlight 'const': {}",
            html
        );
        assert!(
            html.contains("<span class=\"hl-comment\">// one</span>"),
            "Should highlight comment: {}",
            html
        );
        assert!(
            html.contains("<span class=\"hl-number\">1</span>"),
            "Should highlight number: {}",
            html
        );
    }

    #[test]
    fn test_highlight_js_string_and_function() {
        // Arrange
        let code = r#"console.log("hello");"#;

        // Act
        let html = highlight(code, "javascript");

        // Assert
        assert!(html.contains("<span class=\"hl-builtin\">console</span>"));
        assert!(html.contains("<span class=\"hl-function\">log</span>("));
        assert!(html.contains("<span class=\"hl-string\">\"hello\"</span>"));
    }

    #[test]
    fn test_highlight_comment_wraps_before_strings() {
        // Arrange
        let code = r#"// say "hi""#;

        // Act
        let html = highlight(code, "js");

        // Assert: the string is nested inside the comment, not the reverse
        assert!(
            html.starts_with("<span class=\"hl-comment\">// say "),
            "Comment should be wrapped first: {}",
            html
        );
    }

    #[test]
    fn test_highlight_keyword_inside_comment_double_wrapped() {
        // Arrange
        let code = "// return early";

        // Act
        let html = highlight(code, "js");

        // Assert
        assert_eq!(
            html,
            "<span class=\"hl-comment\">// <span class=\"hl-keyword\">return</span> early</span>"
        );
    }

    #[test]
    fn test_highlight_never_rewrites_markup() {
        // Arrange: `class` is a keyword and appears in every emitted span
        let code = "class A { /* class */ }";

        // Act
        let html = highlight(code, "ts");

        // Assert
        assert!(!html.contains("<span <span"), "Markup corrupted: {}", html);
        assert!(!html.contains("=\"<span"), "Markup corrupted: {}", html);
    }

    #[test]
    fn test_highlight_python() {
        // Arrange
        let code = "def greet(name):\n    # say hi\n    print(\"hi\", name)\n    return None";

        // Act
        let html = highlight(code, "python");

        // Assert
        assert!(html.contains("<span class=\"hl-keyword\">def</span>"));
        assert!(html.contains("<span class=\"hl-function\">greet</span>("));
        assert!(html.contains("<span class=\"hl-comment\"># say hi</span>"));
        assert!(html.contains("<span class=\"hl-builtin\">print</span>("));
        assert!(html.contains("<span class=\"hl-keyword\">None</span>"));
    }

    #[test]
    fn test_highlight_sql_case_insensitive() {
        // Arrange
        let code = "select COUNT(*) FROM users -- all rows";

        // Act
        let html = highlight(code, "sql");

        // Assert
        assert!(html.contains("<span class=\"hl-keyword\">select</span>"));
        assert!(html.contains("<span class=\"hl-keyword\">FROM</span>"));
        assert!(html.contains("<span class=\"hl-builtin\">COUNT</span>("));
        // `all` is also a keyword, so the comment body is wrapped twice
        assert!(html.contains("<span class=\"hl-comment\">-- <span class=\"hl-keyword\">all</span> rows</span>"));
    }

    #[test]
    fn test_highlight_css() {
        // Arrange
        let code = ".card {\n  color: #fff;\n  margin: 4px !important;\n}";

        // Act
        let html = highlight(code, "css");

        // Assert
        assert!(html.contains("<span class=\"hl-property\">color</span>:"));
        assert!(html.contains("<span class=\"hl-number\">#fff</span>"));
        assert!(html.contains("<span class=\"hl-number\">4px</span>"));
        assert!(html.contains("<span class=\"hl-keyword\">!important</span>"));
    }

    #[test]
    fn test_highlight_html_tags_and_attributes() {
        // Arrange
        let code = r#"<a href="/x">link</a><!-- note -->"#;

        // Act
        let html = highlight(code, "html");

        // Assert
        assert!(html.contains("&lt;<span class=\"hl-tag\">a</span>"));
        assert!(html.contains(" <span class=\"hl-attr\">href</span>="));
        assert!(html.contains("<span class=\"hl-string\">\"/x\"</span>"));
        assert!(html.contains("&lt;/<span class=\"hl-tag\">a</span>&gt;"));
        assert!(html.contains("<span class=\"hl-comment\">&lt;!-- note --&gt;</span>"));
    }

    #[test]
    fn test_highlight_json_keys_and_values() {
        // Arrange
        let code = "{\n  \"name\": \"Ada\",\n  \"age\": 36,\n  \"admin\": true\n}";

        // Act
        let html = highlight(code, "json");

        // Assert
        assert!(html.contains("<span class=\"hl-property\">\"name\"</span>:"));
        assert!(html.contains("<span class=\"hl-string\">\"Ada\"</span>,"));
        assert!(html.contains("<span class=\"hl-number\">36</span>"));
        assert!(html.contains("<span class=\"hl-keyword\">true</span>"));
        assert!(!html.contains("hl-function"), "JSON has no call rule");
    }

    #[test]
    fn test_highlight_unsupported_language_fallback() {
        // Arrange
        let code = "fn main() {}";

        // Act
        let html = highlight(code, "rust");

        // Assert
        assert!(!html.contains("hl-"), "Should not contain highlight classes");
        assert_eq!(html, "fn main() {}");
    }

    #[test]
    fn test_highlight_html_escaping() {
        // Arrange
        let code = "if (a < b && b > c) {}";

        // Act
        let html = highlight(code, "js");

        // Assert
        assert!(html.contains("&lt;"), "Should escape '<'");
        assert!(html.contains("&gt;"), "Should escape '>'");
        assert!(html.contains("&amp;&amp;"), "Should escape '&'");
    }

    #[test]
    fn test_highlight_empty_code() {
        // Arrange & Act
        let html = highlight("", "js");

        // Assert
        assert_eq!(html, "", "Should return empty string for empty input");
    }

    #[test]
    fn test_highlight_class_css_names() {
        // Arrange & Act & Assert
        assert_eq!(HighlightClass::Comment.css_class(), "hl-comment");
        assert_eq!(HighlightClass::String.css_class(), "hl-string");
        assert_eq!(HighlightClass::Number.css_class(), "hl-number");
        assert_eq!(HighlightClass::Keyword.css_class(), "hl-keyword");
        assert_eq!(HighlightClass::Attribute.css_class(), "hl-attr");
        assert_eq!(HighlightClass::Function.css_class(), "hl-function");
    }

    #[test]
    fn test_language_name() {
        // Arrange & Act & Assert
        assert_eq!(Language::JsLike.name(), "javascript");
        assert_eq!(Language::Plain.name(), "plain");
    }

    #[test]
    fn test_all_rule_tables_compile() {
        // Arrange
        let languages = [
            Language::JsLike,
            Language::CssLike,
            Language::HtmlLike,
            Language::PythonLike,
            Language::Sql,
            Language::Json,
        ];

        // Act & Assert
        for language in languages {
            assert!(!language.rules().is_empty(), "{:?} has no rules", language);
        }
    }
}
