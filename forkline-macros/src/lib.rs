use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs an `async fn main` on a forkline runtime.
///
/// Accepts an optional `job_budget = N` argument, forwarded to
/// `RuntimeBuilder::job_budget`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let job_budget = match parse_job_budget(&attr.to_string()) {
        Ok(job_budget) => job_budget,
        Err(message) => return compile_error(&message),
    };

    wrap_body(item, &runtime_builder(job_budget), false)
}

/// Runs an `async fn` test on a fresh forkline runtime.
///
/// Accepts the same `job_budget = N` argument as [`macro@main`].
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let job_budget = match parse_job_budget(&attr.to_string()) {
        Ok(job_budget) => job_budget,
        Err(message) => return compile_error(&message),
    };

    wrap_body(item, &runtime_builder(job_budget), true)
}

fn parse_job_budget(attr: &str) -> Result<Option<usize>, String> {
    let mut job_budget = None;

    for part in attr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some(value) = part.strip_prefix("job_budget") else {
            return Err(format!("unknown runtime argument `{part}`"));
        };

        let value = value.trim_start().trim_start_matches('=').trim();

        match value.parse::<usize>() {
            Ok(n) if n > 0 => job_budget = Some(n),
            _ => return Err(format!("`job_budget` expects a positive integer, got `{value}`")),
        }
    }

    Ok(job_budget)
}

fn runtime_builder(job_budget: Option<usize>) -> String {
    let mut builder = String::from("::forkline::RuntimeBuilder::new()");

    if let Some(n) = job_budget {
        builder.push_str(&format!(".job_budget({n})"));
    }

    builder.push_str(".build()");
    builder
}

/// Replaces the body of an `async fn` with a `block_on` of that body.
fn wrap_body(item: TokenStream, builder: &str, is_test: bool) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return compile_error("expected an `async fn` with a body");
    };

    let body = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_body = format!(
        "{{
            let runtime = {builder};
            runtime
                .block_on(async move {{ {body} }})
                .expect(\"runtime stalled before the main future completed\")
        }}"
    );

    let stream = match new_body.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return compile_error(&format!("forkline macro error: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));

    let mut result: Vec<TokenTree> = Vec::new();

    if is_test {
        result.extend("#[test]".parse::<TokenStream>().unwrap_or_default());
    }

    result.extend(tokens);
    result.into_iter().collect()
}

fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
