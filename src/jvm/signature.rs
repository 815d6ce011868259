//! Split descriptors and signatures into a skeleton plus the type names they mention
//!
//! Method descriptors and generic signatures tend to repeat the same handful of packages and
//! classes over and over. Pulling the names out leaves a short "formatted" skeleton that is
//! shared between many descriptors:
//!
//! ```
//! use jimage_decompress::jvm::signature::{reconstruct, ParsedSignature, TypeName};
//!
//! let parsed = ParsedSignature::parse("(Ljava/lang/String;I)V");
//! assert_eq!(parsed.formatted, "(L;I)V");
//! assert_eq!(parsed.types, vec![TypeName::new("java/lang", "String")]);
//! assert_eq!(
//!     reconstruct("(L;I)V", &["java/lang", "String"]).unwrap(),
//!     "(Ljava/lang/String;I)V",
//! );
//! ```

use super::Error;

/// Package and simple name of a class mentioned in a descriptor
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TypeName {
    /// Slash separated package (empty for the unnamed package)
    pub package: String,
    pub class: String,
}

impl TypeName {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> TypeName {
        TypeName {
            package: package.into(),
            class: class.into(),
        }
    }

    /// Split a binary name like `java/lang/String` at its last `/`
    pub fn split(binary_name: &str) -> TypeName {
        match binary_name.rfind('/') {
            Some(idx) => TypeName::new(&binary_name[..idx], &binary_name[idx + 1..]),
            None => TypeName::new("", binary_name),
        }
    }
}

/// Descriptor with the class names cut out of it
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedSignature {
    /// Descriptor where every class reference has been reduced to just its `L` marker (the
    /// terminating `;`, `<`, or `:` is kept)
    pub formatted: String,

    /// Class references, in the order their `L` markers appear in `formatted`
    pub types: Vec<TypeName>,
}

impl ParsedSignature {
    /// Scan a descriptor or signature
    ///
    /// An `L` seen outside of a class name starts a class name, which then runs until the next
    /// `;`, `<`, or `:`. Nothing else is validated, so this never fails: a class name which is
    /// never terminated is silently dropped (and `reconstruct` will then not reproduce the input).
    pub fn parse(descriptor: &str) -> ParsedSignature {
        let mut formatted = String::with_capacity(descriptor.len());
        let mut types = vec![];
        let mut class_name: Option<String> = None;

        for c in descriptor.chars() {
            match c {
                'L' if class_name.is_none() => {
                    class_name = Some(String::new());
                    formatted.push(c);
                }
                ';' | ':' | '<' => {
                    if let Some(full_name) = class_name.take() {
                        types.push(TypeName::split(&full_name));
                    }
                    formatted.push(c);
                }
                _ => match class_name.as_mut() {
                    Some(name) => name.push(c),
                    None => formatted.push(c),
                },
            }
        }

        ParsedSignature { formatted, types }
    }

    /// Flattened `package, class, package, class, ...` list, as consumed by [`reconstruct`]
    pub fn arguments(&self) -> impl Iterator<Item = &str> + '_ {
        self.types
            .iter()
            .flat_map(|typ| [typ.package.as_str(), typ.class.as_str()])
    }

    /// Put the class names back into the skeleton
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.formatted.len());
        let mut types = self.types.iter();
        for c in self.formatted.chars() {
            out.push(c);
            if c == 'L' {
                if let Some(typ) = types.next() {
                    push_class_name(&mut out, &typ.package, &typ.class);
                }
            }
        }
        out
    }
}

/// Rebuild a descriptor from its skeleton and a flat `package, class, ...` argument list
///
/// Every `L` in `formatted` consumes two arguments. Having fewer arguments than that is an error.
pub fn reconstruct<S: AsRef<str>>(formatted: &str, arguments: &[S]) -> Result<String, Error> {
    let mut out = String::with_capacity(formatted.len());
    let mut arguments = arguments.iter();
    for c in formatted.chars() {
        out.push(c);
        if c == 'L' {
            match (arguments.next(), arguments.next()) {
                (Some(package), Some(class)) => {
                    push_class_name(&mut out, package.as_ref(), class.as_ref())
                }
                _ => {
                    let msg = format!("Not enough type arguments for '{}'", formatted);
                    return Err(Error::MalformedDescriptor(msg));
                }
            }
        }
    }
    Ok(out)
}

fn push_class_name(out: &mut String, package: &str, class: &str) {
    if !package.is_empty() {
        out.push_str(package);
        out.push('/');
    }
    out.push_str(class);
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(descriptor: &str, formatted: &str, types: &[(&str, &str)]) {
        let parsed = ParsedSignature::parse(descriptor);
        assert_eq!(parsed.formatted, formatted);
        let expected: Vec<TypeName> = types
            .iter()
            .map(|(package, class)| TypeName::new(*package, *class))
            .collect();
        assert_eq!(parsed.types, expected);

        let arguments: Vec<&str> = parsed.arguments().collect();
        assert_eq!(reconstruct(&parsed.formatted, &arguments).unwrap(), descriptor);
        assert_eq!(parsed.reconstruct(), descriptor);
    }

    #[test]
    fn method_descriptors() {
        round_trip("(Ljava/lang/String;I)V", "(L;I)V", &[("java/lang", "String")]);
        round_trip("()V", "()V", &[]);
        round_trip(
            "(IDLjava/lang/Integer;)Ljava/lang/Object;",
            "(IDL;)L;",
            &[("java/lang", "Integer"), ("java/lang", "Object")],
        );
        round_trip("([[Ljava/util/Map;J)[I", "([[L;J)[I", &[("java/util", "Map")]);
    }

    #[test]
    fn unnamed_package() {
        round_trip("LFoo;", "L;", &[("", "Foo")]);
    }

    #[test]
    fn class_names_containing_l() {
        round_trip("Lorg/LLVM/Lexer;", "L;", &[("org/LLVM", "Lexer")]);
    }

    #[test]
    fn generic_signatures() {
        round_trip(
            "Ljava/util/List<Ljava/lang/String;>;",
            "L<L;>;",
            &[("java/util", "List"), ("java/lang", "String")],
        );
        round_trip(
            "<T:Ljava/lang/Object;>(TT;)Ljava/util/Map$Entry<TT;*>;",
            "<T:L;>(TT;)L<TT;*>;",
            &[("java/lang", "Object"), ("java/util", "Map$Entry")],
        );
        round_trip(
            "<E::Ljava/lang/Comparable<-TE;>;>Ljava/lang/Object;",
            "<E::L<-TE;>;>L;",
            &[("java/lang", "Comparable"), ("java/lang", "Object")],
        );
    }

    #[test]
    fn not_enough_arguments() {
        assert!(matches!(
            reconstruct("(L;L;)V", &["java/lang", "String", "java/lang"]),
            Err(Error::MalformedDescriptor(_))
        ));
        assert_eq!(reconstruct::<&str>("(I)V", &[]).unwrap(), "(I)V");
    }

    #[test]
    fn unterminated_class_name_is_dropped() {
        let parsed = ParsedSignature::parse("(Ljava/lang/String");
        assert_eq!(parsed.formatted, "(L");
        assert!(parsed.types.is_empty());
        assert_ne!(parsed.reconstruct(), "(Ljava/lang/String");
    }
}
