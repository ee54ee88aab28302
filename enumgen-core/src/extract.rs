//! Constant group extraction from a package symbol table.
//!
//! Given a [`PackageInfo`] and a type name, finds the named type, classifies
//! its underlying representation and collects every constant declared with
//! exactly that type:
//! - `type Color int` + `const Red Color = 1` → IntegerLike group
//! - `type Status string` + `const Active Status = "active"` → StringLike group
//!
//! Symbol tables have no stable iteration order, so the collected values are
//! always sorted by name.

use tracing::debug;

use crate::error::{EnumgenError, EnumgenResult};
use crate::model::{
    BasicFamily, ConstantGroup, ConstantValue, PackageInfo, Symbol, SymbolKind, Underlying,
    UnderlyingKind,
};

/// Extracts the constant group for `type_name` from `pkg`.
pub fn extract(pkg: &PackageInfo, type_name: &str) -> EnumgenResult<ConstantGroup> {
    let underlying = find_named_type(pkg, type_name)
        .ok_or_else(|| EnumgenError::type_not_found(type_name))?;

    let kind = classify(type_name, underlying)?;
    let full_name = pkg.qualify(type_name);

    let mut values = Vec::new();
    for symbol in pkg.symbols.values() {
        let SymbolKind::Const { ty, value } = &symbol.kind else {
            continue;
        };
        if ty.as_str() != full_name {
            continue;
        }

        let expected = match kind {
            UnderlyingKind::IntegerLike => BasicFamily::Integer,
            UnderlyingKind::StringLike => BasicFamily::String,
        };
        if value.family() != Some(expected) {
            return Err(EnumgenError::internal(format!(
                "constant {} of type {} has no {} value ({})",
                symbol.name,
                full_name,
                kind,
                value.exact_string()
            )));
        }

        values.push(ConstantValue::new(&symbol.name, value.exact_string()));
    }

    let group = ConstantGroup::new(full_name, type_name, kind, values);
    debug!(
        type_name = %group.name,
        kind = %group.kind,
        constants = group.values.len(),
        "Extracted constant group"
    );
    Ok(group)
}

/// Finds the declared type named `type_name`, ignoring constants and other symbols.
fn find_named_type<'a>(pkg: &'a PackageInfo, type_name: &str) -> Option<&'a Underlying> {
    pkg.symbols
        .get(type_name)
        .into_iter()
        .chain(pkg.symbols.values())
        .find_map(|symbol: &Symbol| match &symbol.kind {
            SymbolKind::Type { underlying } if symbol.name == type_name => Some(underlying),
            _ => None,
        })
}

/// Classifies a type's underlying representation.
pub fn classify(type_name: &str, underlying: &Underlying) -> EnumgenResult<UnderlyingKind> {
    match underlying {
        Underlying::Basic(basic) => match basic.family() {
            BasicFamily::Integer => Ok(UnderlyingKind::IntegerLike),
            BasicFamily::String => Ok(UnderlyingKind::StringLike),
            _ => Err(EnumgenError::unsupported_kind(type_name, underlying.to_string())),
        },
        Underlying::Composite(_) | Underlying::Unresolved(_) => {
            Err(EnumgenError::unsupported_kind(type_name, underlying.to_string()))
        }
    }
}
