//! Parser for `.mdesc` descriptor files.
//!
//! Format:
//! ```text
//! // comment
//! [open] [automatic | unnamed] module <name>
//!
//! requires [transitive] [static] <module>
//! exports <package> [to <module>, <module>...]
//! opens <package> [to <module>, ...]
//! provides <service> with <provider>[, <provider>...]
//! uses <service>
//! contains <package>
//! ```
//!
//! A trailing `;` on any line is accepted. `unnamed module` may omit its name.

use modgraph_common::{FileId, Span};

use crate::descriptor::{
    is_qualified_name, DescriptorBuilder, ModuleDescriptor, ModuleKind, Requires, UNNAMED_MODULE,
};
use crate::error::{ParseError, ParseResult};

/// File extension of descriptor files on the module path.
pub const DESCRIPTOR_EXTENSION: &str = "mdesc";

/// A descriptor read from a file, with the span of its module declaration.
#[derive(Debug, Clone)]
pub struct DescriptorFile {
    pub descriptor: ModuleDescriptor,
    pub file: FileId,
    pub decl_span: Span,
}

/// One non-empty line with its span in the file.
struct Line<'a> {
    text: &'a str,
    span: Span,
}

impl<'a> Line<'a> {
    fn words(&self) -> Vec<&'a str> {
        self.text.split_whitespace().collect()
    }
}

struct Parser {
    file: FileId,
    header: Option<(DescriptorBuilder, Span)>,
}

impl DescriptorFile {
    /// Parses descriptor text registered in a source map under `file`.
    pub fn parse(content: &str, file: FileId) -> ParseResult<Self> {
        let mut parser = Parser { file, header: None };
        for line in lines(content) {
            parser.line(&line)?;
        }

        let (builder, decl_span) = parser.header.ok_or_else(|| ParseError::Syntax {
            file,
            span: Span::dummy(),
            message: "missing module declaration".to_string(),
        })?;

        let descriptor = builder.build().map_err(|error| ParseError::Malformed {
            file,
            span: decl_span,
            error,
        })?;

        Ok(DescriptorFile {
            descriptor,
            file,
            decl_span,
        })
    }
}

impl Parser {
    fn error(&self, line: &Line<'_>, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            file: self.file,
            span: line.span,
            message: message.into(),
        }
    }

    fn line(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let words = line.words();
        if is_header(&words) {
            return self.header(line, &words);
        }

        let directive = words[0];
        let Some((builder, decl_span)) = self.header.take() else {
            return Err(self.error(
                line,
                format!("expected module declaration before `{}`", directive),
            ));
        };

        let builder = match directive {
            "requires" => self.requires(line, builder, &words[1..])?,
            "exports" | "opens" => self.grant(line, builder, directive, &words[1..])?,
            "provides" => self.provides(line, builder, &words[1..])?,
            "uses" => builder.uses(self.single_name(line, directive, &words[1..])?),
            "contains" => builder.contains(self.single_name(line, directive, &words[1..])?),
            other => return Err(self.error(line, format!("unknown directive `{}`", other))),
        };

        self.header = Some((builder, decl_span));
        Ok(())
    }

    fn header(&mut self, line: &Line<'_>, words: &[&str]) -> ParseResult<()> {
        if self.header.is_some() {
            return Err(self.error(line, "duplicate module declaration"));
        }

        let mut kind = ModuleKind::Explicit;
        let mut open = false;
        let mut rest = words;
        while let Some((&word, tail)) = rest.split_first() {
            rest = tail;
            match word {
                "open" if !open => open = true,
                "automatic" if kind == ModuleKind::Explicit => kind = ModuleKind::Automatic,
                "unnamed" if kind == ModuleKind::Explicit => kind = ModuleKind::Unnamed,
                "module" => break,
                _ => {
                    return Err(self.error(line, format!("unexpected `{}` in module declaration", word)))
                }
            }
        }

        let name = match (rest, kind) {
            ([], ModuleKind::Unnamed) => UNNAMED_MODULE,
            ([name], _) => *name,
            ([], _) => return Err(self.error(line, "expected module name")),
            _ => return Err(self.error(line, "unexpected tokens after module name")),
        };

        let mut builder = ModuleDescriptor::builder(name).kind(kind);
        if open {
            builder = builder.open();
        }
        self.header = Some((builder, line.span));
        Ok(())
    }

    fn requires(
        &self,
        line: &Line<'_>,
        builder: DescriptorBuilder,
        words: &[&str],
    ) -> ParseResult<DescriptorBuilder> {
        let mut transitive = false;
        let mut optional = false;
        let mut target = None;

        for &word in words {
            match word {
                "transitive" if target.is_none() && !transitive => transitive = true,
                "static" if target.is_none() && !optional => optional = true,
                _ if target.is_none() => target = Some(word),
                _ => {
                    return Err(self.error(line, format!("unexpected `{}` after requires target", word)))
                }
            }
        }

        let target = target.ok_or_else(|| self.error(line, "expected module name after `requires`"))?;
        self.check_name(line, target)?;

        let mut req = Requires::new(target);
        req.transitive = transitive;
        req.optional = optional;
        Ok(builder.require(req))
    }

    fn grant(
        &self,
        line: &Line<'_>,
        builder: DescriptorBuilder,
        directive: &str,
        words: &[&str],
    ) -> ParseResult<DescriptorBuilder> {
        let (package, targets) = match words {
            [] => return Err(self.error(line, format!("expected package after `{}`", directive))),
            [package] => (*package, None),
            [package, "to", rest @ ..] => (*package, Some(self.name_list(line, "to", rest)?)),
            [_, word, ..] => {
                return Err(self.error(line, format!("expected `to` after package, found `{}`", word)))
            }
        };
        self.check_name(line, package)?;

        Ok(match (directive, targets) {
            ("exports", None) => builder.exports(package),
            ("exports", Some(targets)) => builder.exports_to(package, targets),
            (_, None) => builder.opens(package),
            (_, Some(targets)) => builder.opens_to(package, targets),
        })
    }

    fn provides(
        &self,
        line: &Line<'_>,
        mut builder: DescriptorBuilder,
        words: &[&str],
    ) -> ParseResult<DescriptorBuilder> {
        let (service, providers) = match words {
            [service, "with", rest @ ..] => (*service, self.name_list(line, "with", rest)?),
            _ => return Err(self.error(line, "expected `provides <service> with <provider>`")),
        };
        self.check_name(line, service)?;

        for provider in providers {
            builder = builder.provides(service, provider);
        }
        Ok(builder)
    }

    fn single_name<'w>(&self, line: &Line<'_>, directive: &str, words: &[&'w str]) -> ParseResult<&'w str> {
        match words {
            [name] => {
                self.check_name(line, name)?;
                Ok(*name)
            }
            [] => Err(self.error(line, format!("expected name after `{}`", directive))),
            _ => Err(self.error(line, format!("`{}` takes a single name", directive))),
        }
    }

    /// Parses `a, b, c` following a keyword.
    fn name_list(&self, line: &Line<'_>, keyword: &str, words: &[&str]) -> ParseResult<Vec<String>> {
        let joined = words.join(" ");
        if joined.trim().is_empty() {
            return Err(self.error(line, format!("expected names after `{}`", keyword)));
        }

        let names: Vec<String> = joined.split(',').map(|n| n.trim().to_string()).collect();
        for name in &names {
            self.check_name(line, name)?;
        }
        Ok(names)
    }

    fn check_name(&self, line: &Line<'_>, name: &str) -> ParseResult<()> {
        if is_qualified_name(name) {
            Ok(())
        } else {
            Err(self.error(line, format!("invalid name `{}`", name)))
        }
    }
}

fn is_header(words: &[&str]) -> bool {
    words
        .iter()
        .take_while(|w| matches!(**w, "open" | "automatic" | "unnamed" | "module"))
        .any(|w| *w == "module")
}

/// Splits content into non-empty, non-comment lines with their spans. A
/// trailing `;` is not part of the line text.
fn lines(content: &str) -> Vec<Line<'_>> {
    let mut result = Vec::new();
    let mut offset = 0;

    for raw in content.split('\n') {
        let start = offset;
        offset += raw.len() + 1;

        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let text = trimmed.trim_end_matches(';').trim_end();
        if text.is_empty() {
            continue;
        }

        let lead = raw.len() - raw.trim_start().len();
        let begin = start + lead;
        result.push(Line {
            text,
            span: Span::from_range(begin..begin + trimmed.len()),
        });
    }

    result
}
