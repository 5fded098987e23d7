use crate::ast::FieldConversion;
use crate::error::{Error, Result};
use crate::transpiler::context::TranslationContext;

impl TranslationContext<'_> {
    /// Wrap a qualified column in its conversion function, if any.
    ///
    /// Arithmetic and concatenation operands are bound as parameters named
    /// after `property`.
    pub fn convert(
        &mut self,
        column: String,
        property: &str,
        conversion: Option<&FieldConversion>,
    ) -> Result<String> {
        let Some(conversion) = conversion else {
            return Ok(column);
        };
        use FieldConversion::*;
        let converted = match conversion {
            StringLength => format!("LENGTH({})", column),
            Trim => format!("TRIM({})", column),
            Upper => format!("UPPER({})", column),
            Lower => format!("LOWER({})", column),
            Count => format!("COUNT({})", column),
            Sum => format!("SUM({})", column),
            Max => format!("MAX({})", column),
            Min => format!("MIN({})", column),
            Avg => format!("AVG({})", column),
            JsonValue(path) => format!("JSON_VALUE({}, {})", column, literal(path)),
            JsonQuery(path) => format!("JSON_QUERY({}, {})", column, literal(path)),
            Add(v) => format!("({} + {})", column, self.add_parameter(property, v.clone())),
            Subtract(v) => format!("({} - {})", column, self.add_parameter(property, v.clone())),
            Multiply(v) => format!("({} * {})", column, self.add_parameter(property, v.clone())),
            Divide(v) => format!("({} / {})", column, self.add_parameter(property, v.clone())),
            Modulo(v) => format!("MOD({}, {})", column, self.add_parameter(property, v.clone())),
            BitAnd(v) => format!("BITAND({}, {})", column, self.add_parameter(property, v.clone())),
            Concat(v) => format!("({} || {})", column, self.add_parameter(property, v.clone())),
            BitOr(_) => return Err(Error::Unsupported("bitwise OR conversion".into())),
            BitXor(_) => return Err(Error::Unsupported("bitwise XOR conversion".into())),
            LeftShift(_) => return Err(Error::Unsupported("left shift conversion".into())),
            RightShift(_) => return Err(Error::Unsupported("right shift conversion".into())),
        };
        Ok(converted)
    }
}

fn literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use crate::fixtures;

    #[test]
    fn test_conversions() {
        let schema = fixtures::schema();
        let mut ctx = fixtures::context(&schema);
        let col = || "TB.\"NAME\"".to_string();
        assert_eq!(ctx.convert(col(), "Name", None).unwrap(), "TB.\"NAME\"");
        assert_eq!(
            ctx.convert(col(), "Name", Some(&FieldConversion::StringLength)).unwrap(),
            "LENGTH(TB.\"NAME\")"
        );
        assert_eq!(
            ctx.convert(col(), "Name", Some(&FieldConversion::JsonValue("$.a".into())))
                .unwrap(),
            "JSON_VALUE(TB.\"NAME\", '$.a')"
        );
        assert_eq!(
            ctx.convert(col(), "Name", Some(&FieldConversion::Modulo(Value::Int(3))))
                .unwrap(),
            "MOD(TB.\"NAME\", :Name0)"
        );
        assert_eq!(
            ctx.parameters().get("Name0").map(|p| &p.value),
            Some(&Value::Int(3))
        );
    }

    #[test]
    fn test_operand_is_bound_not_inlined() {
        let schema = fixtures::schema();
        let mut ctx = fixtures::context(&schema);
        let operand = Value::String("x') OR 1=1 --".into());
        let sql = ctx
            .convert(
                "TB.\"NAME\"".into(),
                "Name",
                Some(&FieldConversion::Concat(operand.clone())),
            )
            .unwrap();
        assert_eq!(sql, "(TB.\"NAME\" || :Name0)");
        assert!(!sql.contains("OR 1=1"));
        assert_eq!(ctx.parameters().get("Name0").map(|p| &p.value), Some(&operand));
    }

    #[test]
    fn test_unsupported_conversion() {
        let schema = fixtures::schema();
        let mut ctx = fixtures::context(&schema);
        let err = ctx.convert(
            "TB.\"FLAGS\"".into(),
            "Flags",
            Some(&FieldConversion::LeftShift(Value::Int(2))),
        );
        assert!(matches!(err, Err(Error::Unsupported(_))));
        assert!(ctx.parameters().is_empty());
    }
}
