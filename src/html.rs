//! Minimal HTML builders for comment bodies. GitHub renders these inline in
//! Markdown, so no escaping or pretty-printing is applied.

/// Render `<name attr='value'...>children</name>`.
pub fn tag(name: &str, attrs: &[(&str, &str)], children: &[&str]) -> String {
    let mut out = String::with_capacity(children.iter().map(|c| c.len()).sum::<usize>() + 16);
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("='");
        out.push_str(value);
        out.push('\'');
    }
    out.push('>');
    for child in children {
        out.push_str(child);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
    out
}

pub fn fragment(children: &[&str]) -> String {
    children.concat()
}

pub fn h2(text: &str) -> String {
    tag("h2", &[], &[text])
}

pub fn b(text: &str) -> String {
    tag("b", &[], &[text])
}

pub fn a(href: &str, text: &str) -> String {
    tag("a", &[("href", href)], &[text])
}

pub fn table(children: &[&str]) -> String {
    tag("table", &[], children)
}

pub fn tbody(children: &[&str]) -> String {
    tag("tbody", &[], children)
}

pub fn tr(children: &[&str]) -> String {
    tag("tr", &[], children)
}

pub fn th(text: &str) -> String {
    tag("th", &[], &[text])
}

pub fn td(text: &str) -> String {
    tag("td", &[], &[text])
}

pub fn details(children: &[&str]) -> String {
    tag("details", &[], children)
}

pub fn summary(text: &str) -> String {
    tag("summary", &[], &[text])
}
