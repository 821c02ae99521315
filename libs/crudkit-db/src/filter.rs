//! Predicate → `sea_orm::Condition` compiler (AST in, SQL out).
//! Building the predicate belongs to `query-core`; this module only consumes it.

use query_core::{Lookup, Operand, OrderKey, Predicate, SortDir};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, Order, QueryOrder, Select,
};
use serde_json::Value as Json;

use crate::fields::{coerce, ensure_string_field, Field, FieldError, FieldMap, FieldResult};

/* ---------- LIKE helpers ---------- */

const LIKE_ESCAPE: char = '\\';

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like_pattern(lookup: Lookup, s: &str) -> LikeExpr {
    let s = like_escape(s);
    let pattern = match lookup {
        Lookup::Contains | Lookup::IContains => format!("%{s}%"),
        Lookup::StartsWith | Lookup::IStartsWith => format!("{s}%"),
        _ => format!("%{s}"),
    };
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

fn lower<C: ColumnTrait>(col: C) -> Expr {
    Expr::expr(Func::lower(Expr::col(col)))
}

fn always_false() -> SimpleExpr {
    Expr::cust("1 = 0")
}

/* ---------- Predicate -> Condition ---------- */

pub fn predicate_to_condition<E: EntityTrait>(
    pred: &Predicate,
    fmap: &FieldMap<E>,
) -> FieldResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    compile::<E>(pred, fmap, false)
}

/// Under a `NOT`, comparisons on nullable columns also require the columns
/// to be non-NULL, so the negation matches rows where they are NULL.
fn compile<E: EntityTrait>(
    pred: &Predicate,
    fmap: &FieldMap<E>,
    negated: bool,
) -> FieldResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    Ok(match pred {
        Predicate::True => Condition::all(),
        Predicate::And(parts) => parts.iter().try_fold(Condition::all(), |acc, p| {
            Ok::<_, FieldError>(acc.add(compile::<E>(p, fmap, negated)?))
        })?,
        Predicate::Or(parts) => parts.iter().try_fold(Condition::any(), |acc, p| {
            Ok::<_, FieldError>(acc.add(compile::<E>(p, fmap, negated)?))
        })?,
        Predicate::Not(inner) => Condition::all()
            .not()
            .add(compile::<E>(inner, fmap, true)?),
        Predicate::Compare {
            field,
            lookup,
            operand,
        } => {
            let f = fmap.require(field)?;
            let (expr, guarded) = match operand {
                Operand::Value(v) => (
                    compare_value(field, f, *lookup, v)?,
                    // `= null` and `isnull` already test NULL explicitly
                    if v.is_null() || *lookup == Lookup::IsNull {
                        vec![]
                    } else {
                        vec![f]
                    },
                ),
                Operand::Field(other) => (
                    compare_field(field, f, *lookup, other, fmap)?,
                    vec![f, fmap.require(other)?],
                ),
            };
            let cond = Condition::all().add(expr);
            if !negated {
                return Ok(cond);
            }
            guarded
                .into_iter()
                .filter(|g| g.nullable)
                .fold(cond, |acc, g| acc.add(Expr::col(g.col).is_not_null()))
        }
    })
}

fn compare_value<E: EntityTrait>(
    name: &str,
    f: &Field<E>,
    lookup: Lookup,
    v: &Json,
) -> FieldResult<SimpleExpr>
where
    E::Column: ColumnTrait + Copy,
{
    let col = f.col;

    // `field = null` means IS NULL
    if v.is_null() {
        return match lookup {
            Lookup::Exact | Lookup::IExact => Ok(Expr::col(col).is_null()),
            other => Err(FieldError::UnsupportedLookup {
                field: name.to_string(),
                lookup: other.as_str(),
            }),
        };
    }

    Ok(match lookup {
        Lookup::Exact => Expr::col(col).eq(coerce(name, f.kind, v)?),
        Lookup::Gt => Expr::col(col).gt(coerce(name, f.kind, v)?),
        Lookup::Gte => Expr::col(col).gte(coerce(name, f.kind, v)?),
        Lookup::Lt => Expr::col(col).lt(coerce(name, f.kind, v)?),
        Lookup::Lte => Expr::col(col).lte(coerce(name, f.kind, v)?),

        Lookup::In => {
            let Json::Array(items) = v else {
                return Err(FieldError::TypeMismatch {
                    field: name.to_string(),
                    expected: f.kind,
                    got: "non-list value for `in`",
                });
            };
            let vals = items
                .iter()
                .map(|item| coerce(name, f.kind, item))
                .collect::<FieldResult<Vec<_>>>()?;
            if vals.is_empty() {
                always_false()
            } else {
                Expr::col(col).is_in(vals)
            }
        }

        Lookup::IsNull => match v {
            Json::Bool(true) => Expr::col(col).is_null(),
            Json::Bool(false) => Expr::col(col).is_not_null(),
            _ => {
                return Err(FieldError::TypeMismatch {
                    field: name.to_string(),
                    expected: crate::FieldKind::Bool,
                    got: "non-bool value for `isnull`",
                })
            }
        },

        textual => {
            ensure_string_field(name, f)?;
            let Json::String(s) = v else {
                return Err(FieldError::TypeMismatch {
                    field: name.to_string(),
                    expected: f.kind,
                    got: "non-string value",
                });
            };
            match textual {
                Lookup::IExact => lower(col).eq(s.to_lowercase()),
                Lookup::Contains | Lookup::StartsWith | Lookup::EndsWith => {
                    Expr::col(col).like(like_pattern(textual, s))
                }
                _ => lower(col).like(like_pattern(textual, &s.to_lowercase())),
            }
        }
    })
}

fn compare_field<E: EntityTrait>(
    name: &str,
    f: &Field<E>,
    lookup: Lookup,
    other: &str,
    fmap: &FieldMap<E>,
) -> FieldResult<SimpleExpr>
where
    E::Column: ColumnTrait + Copy,
{
    let rhs = fmap.require(other)?.col;
    let col = f.col;
    Ok(match lookup {
        Lookup::Exact => Expr::col(col).eq(Expr::col(rhs)),
        Lookup::Gt => Expr::col(col).gt(Expr::col(rhs)),
        Lookup::Gte => Expr::col(col).gte(Expr::col(rhs)),
        Lookup::Lt => Expr::col(col).lt(Expr::col(rhs)),
        Lookup::Lte => Expr::col(col).lte(Expr::col(rhs)),
        Lookup::IExact => {
            ensure_string_field(name, f)?;
            lower(col).eq(Expr::expr(Func::lower(Expr::col(rhs))))
        }
        other_lookup => {
            return Err(FieldError::UnsupportedLookup {
                field: name.to_string(),
                lookup: other_lookup.as_str(),
            })
        }
    })
}

/* ---------- ordering ---------- */

pub fn apply_order<E: EntityTrait>(
    mut select: Select<E>,
    keys: &[OrderKey],
    fmap: &FieldMap<E>,
) -> FieldResult<Select<E>>
where
    E::Column: ColumnTrait + Copy,
{
    for key in keys {
        let f = fmap.require(&key.field)?;
        let order = match key.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };
        select = select.order_by(f.col, order);
    }
    Ok(select)
}
