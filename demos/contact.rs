//! Recognizes an email address or a North American phone number.
//!
//! ```text
//! cargo run --example contact -- 555-555-5555
//! echo 'someone@example.com' | RUST_LOG=burrow=trace cargo run --example contact
//! ```

use std::{env, error::Error, io};

use burrow::{
    first, log_tracer, longest, many, many_with_sep, n_bytes, next_named_tag, one_byte, optional,
    pattern,
    predicate::{ascii_alpha, ascii_digit, in_set},
    rule, rules, seq, seq_named, Cursor, Match, Rule, Tag,
};
use tracing_subscriber::EnvFilter;

struct Grammar {
    contact: Rule,
}

impl Grammar {
    fn new() -> Result<Grammar, Box<dyn Error>> {
        let dot_atom_tag = next_named_tag("DotAtom");
        let email_tag = next_named_tag("EmailAddress");
        let area_tag = next_named_tag("AreaCode");
        let local_tag = next_named_tag("LocalCode");
        let personal_tag = next_named_tag("PersonalCode");
        let phone_tag = next_named_tag("PhoneNumber");
        let extension_tag = next_named_tag("Extension");

        let atext = first(rules![
            one_byte(Tag::LITERAL, ascii_alpha()),
            one_byte(Tag::LITERAL, ascii_digit()),
            one_byte(Tag::LITERAL, in_set(b"!#$%&'*+-/=?^_`{|}~")),
        ]);

        let dot_atom = rule(many_with_sep(
            dot_atom_tag,
            1,
            many(Tag::LITERAL, 1, atext),
            one_byte(Tag::LITERAL, in_set(b".")),
        ));

        let email = seq_named(
            email_tag,
            vec![
                ("local", Rule::clone(&dot_atom)),
                ("", rule(one_byte(Tag::LITERAL, in_set(b"@")))),
                ("domain", dot_atom),
            ],
        );

        let hyphen = || optional(one_byte(Tag::LITERAL, in_set(b"-")));
        let extension = optional(pattern(extension_tag, r"\s*(x|ext\.?)\s*[0-9]{1,5}", 16)?);

        let phone = seq(
            phone_tag,
            rules![
                n_bytes(area_tag, 3, 3, ascii_digit()),
                hyphen(),
                n_bytes(local_tag, 3, 3, ascii_digit()),
                hyphen(),
                n_bytes(personal_tag, 4, 4, ascii_digit()),
                extension,
            ],
        );

        Ok(Grammar {
            contact: rule(longest(rules![phone, email])),
        })
    }
}

fn print_tree(m: &Match, depth: usize) {
    let indent = "  ".repeat(depth);
    match m.groups().next() {
        Some(_) => {
            let mut names: Vec<_> = m.groups().map(|(name, _)| name).collect();
            names.sort_unstable();
            println!("{}{} {:?} groups={:?}", indent, m.tag(), m.text(), names);
        }
        None => println!("{}{} {:?}", indent, m.tag(), m.text()),
    }

    for sub in m.submatches() {
        print_tree(sub, depth + 1);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let grammar = Grammar::new()?;

    let mut cursor = match env::args().nth(1) {
        Some(arg) => Cursor::from_bytes(arg),
        None => Cursor::from_reader(io::stdin()),
    }
    .with_tracer(log_tracer());

    match cursor.parse(&grammar.contact)? {
        Some(m) => {
            print_tree(&m, 0);
            let location = cursor.location()?;
            println!("matched {} bytes, stopped at {}", m.len(), location);
        }
        None => {
            println!("no contact information found");
            std::process::exit(1);
        }
    }

    Ok(())
}
