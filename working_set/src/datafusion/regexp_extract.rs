//! Implementation of [`ScalarUDFImpl`] for extracting a regular expression capture group.
/*
* Copyright 2022-2025 Crown Copyright
*
* Licensed under the Apache License, Version 2.0 (the "License");
* you may not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*     http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing, software
* distributed under the License is distributed on an "AS IS" BASIS,
* WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
* See the License for the specific language governing permissions and
* limitations under the License.
*/
use arrow::{
    array::{AsArray, StringBuilder},
    datatypes::DataType,
};
use datafusion::{
    common::{exec_err, plan_err},
    error::{DataFusionError, Result},
    logical_expr::{ColumnarValue, ScalarFunctionArgs, ScalarUDFImpl, Signature, Volatility},
    scalar::ScalarValue,
};
use regex::Regex;
use std::{
    any::Any,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

/// Extracts one capture group of the first match of a pattern in a string column.
///
/// If the pattern doesn't match, or the group didn't take part in the match, the result
/// is an empty string. Null inputs give null.
#[derive(Debug)]
pub struct RegexpExtract {
    pattern: Regex,
    group: usize,
    signature: Signature,
}

impl RegexpExtract {
    /// Compile `pattern` to extract capture group `group`. Group 0 is the whole match.
    ///
    /// # Errors
    /// If the pattern is not a valid regular expression or has no group `group`.
    pub fn try_new(pattern: &str, group: usize) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| DataFusionError::External(Box::new(e)))?;
        if group >= pattern.captures_len() {
            return plan_err!(
                "regexp_extract group {group} out of range, pattern {} has {} groups",
                pattern.as_str(),
                pattern.captures_len() - 1
            );
        }
        Ok(Self {
            pattern,
            group,
            signature: Signature::string(1, Volatility::Immutable),
        })
    }

    fn extract<'a>(&self, value: &'a str) -> &'a str {
        self.pattern
            .captures(value)
            .and_then(|c| c.get(self.group))
            .map_or("", |m| m.as_str())
    }

    fn extract_all<'a>(&self, values: impl Iterator<Item = Option<&'a str>>) -> StringBuilder {
        let mut builder = StringBuilder::new();
        for value in values {
            builder.append_option(value.map(|v| self.extract(v)));
        }
        builder
    }
}

impl ScalarUDFImpl for RegexpExtract {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &'static str {
        "regexp_extract"
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(DataType::Utf8)
    }

    fn invoke_with_args(&self, args: ScalarFunctionArgs) -> Result<ColumnarValue> {
        if args.args.len() != 1 {
            return exec_err!(
                "regexp_extract called with {} input columns, only accepts 1",
                args.args.len()
            );
        }
        match &args.args[0] {
            ColumnarValue::Scalar(
                ScalarValue::Utf8(v) | ScalarValue::LargeUtf8(v) | ScalarValue::Utf8View(v),
            ) => Ok(ColumnarValue::Scalar(ScalarValue::Utf8(
                v.as_deref().map(|s| self.extract(s).to_owned()),
            ))),
            ColumnarValue::Array(arr) => {
                let mut builder = match arr.data_type() {
                    DataType::Utf8 => self.extract_all(arr.as_string::<i32>().iter()),
                    DataType::LargeUtf8 => self.extract_all(arr.as_string::<i64>().iter()),
                    DataType::Utf8View => self.extract_all(arr.as_string_view().iter()),
                    other => {
                        return exec_err!(
                            "regexp_extract called with unsupported column datatype {other:?}"
                        );
                    }
                };
                Ok(ColumnarValue::Array(Arc::new(builder.finish())))
            }
            ColumnarValue::Scalar(_) => exec_err!(
                "regexp_extract called with unsupported column datatype {:?}",
                args.args[0].data_type()
            ),
        }
    }

    fn equals(&self, other: &dyn ScalarUDFImpl) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| o.pattern.as_str() == self.pattern.as_str() && o.group == self.group)
    }

    fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name().hash(&mut hasher);
        self.pattern.as_str().hash(&mut hasher);
        self.group.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RegexpExtract;
    use crate::query::CAMPAIGN_PATTERN;
    use arrow::{
        array::{Array, AsArray, StringArray, StringViewArray},
        datatypes::{DataType, Field},
    };
    use datafusion::{
        error::DataFusionError,
        logical_expr::{ColumnarValue, ScalarFunctionArgs, ScalarUDFImpl},
        scalar::ScalarValue,
    };
    use std::sync::Arc;

    fn invoke(
        udf: &RegexpExtract,
        arg: ColumnarValue,
        rows: usize,
    ) -> Result<ColumnarValue, DataFusionError> {
        let data_type = arg.data_type();
        udf.invoke_with_args(ScalarFunctionArgs {
            number_rows: rows,
            args: vec![arg],
            return_field: Arc::new(Field::new("", DataType::Utf8, true)),
            arg_fields: vec![Arc::new(Field::new("", data_type, true))],
        })
    }

    fn as_strings(value: ColumnarValue) -> Vec<Option<String>> {
        match value {
            ColumnarValue::Array(arr) => arr
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(ToOwned::to_owned))
                .collect(),
            ColumnarValue::Scalar(ScalarValue::Utf8(v)) => vec![v],
            ColumnarValue::Scalar(other) => panic!("Unexpected scalar {other:?}"),
        }
    }

    #[test]
    fn should_extract_campaign() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new(CAMPAIGN_PATTERN, 1)?;
        let names = StringArray::from(vec![
            Some("/Primary/RunIISummer20-v1/AODSIM"),
            Some("/A/Camp1-v1/TIER"),
            Some("malformed"),
            Some("/A/no_hyphen/TIER"),
            None,
        ]);

        // When
        let result = invoke(&udf, ColumnarValue::Array(Arc::new(names)), 5)?;

        // Then
        assert_eq!(
            as_strings(result),
            vec![
                Some("RunIISummer20".into()),
                Some("Camp1".into()),
                Some(String::new()),
                Some(String::new()),
                None
            ]
        );
        Ok(())
    }

    #[test]
    fn should_only_match_ascii_word_characters_in_campaign() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new(CAMPAIGN_PATTERN, 1)?;
        let names = StringArray::from(vec!["/P/Cämp-v1/T", "/P/Camp_9-v1/T", "/P/Ĉamp-v1/T"]);

        // When
        let result = invoke(&udf, ColumnarValue::Array(Arc::new(names)), 3)?;

        // Then
        assert_eq!(
            as_strings(result),
            vec![Some(String::new()), Some("Camp_9".into()), Some(String::new())]
        );
        Ok(())
    }

    #[test]
    fn should_give_empty_string_for_non_participating_group() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new("^(a)?b", 1)?;

        // When
        let result = invoke(
            &udf,
            ColumnarValue::Scalar(ScalarValue::Utf8(Some("b".into()))),
            1,
        )?;

        // Then
        assert_eq!(as_strings(result), vec![Some(String::new())]);
        Ok(())
    }

    #[test]
    fn should_read_string_views() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new(CAMPAIGN_PATTERN, 1)?;
        let names = StringViewArray::from(vec![Some("/P/Camp_2-v3/RAW"), None]);

        // When
        let result = invoke(&udf, ColumnarValue::Array(Arc::new(names)), 2)?;

        // Then
        let ColumnarValue::Array(arr) = &result else {
            panic!("Expected array result");
        };
        assert_eq!(arr.null_count(), 1);
        assert_eq!(as_strings(result)[0].as_deref(), Some("Camp_2"));
        Ok(())
    }

    #[test]
    fn should_pass_through_null_scalar() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new(CAMPAIGN_PATTERN, 1)?;

        // When
        let result = invoke(&udf, ColumnarValue::Scalar(ScalarValue::Utf8(None)), 3)?;

        // Then
        assert_eq!(as_strings(result), vec![None]);
        Ok(())
    }

    #[test]
    fn should_reject_invalid_pattern() {
        assert!(RegexpExtract::try_new("(unclosed", 1).is_err());
    }

    #[test]
    fn should_reject_missing_group() {
        let result = RegexpExtract::try_new("^(a)", 2);
        assert!(matches!(result, Err(DataFusionError::Plan(_))));
    }

    #[test]
    fn should_fail_with_unsupported_type() -> Result<(), DataFusionError> {
        // Given
        let udf = RegexpExtract::try_new(CAMPAIGN_PATTERN, 1)?;

        // When
        let result = invoke(&udf, ColumnarValue::Scalar(ScalarValue::Int64(Some(1))), 1);

        // Then
        assert!(matches!(result, Err(DataFusionError::Execution(_))));
        Ok(())
    }

    #[test]
    fn should_compare_by_pattern_and_group() -> Result<(), DataFusionError> {
        let first = RegexpExtract::try_new("^(a)(b)", 1)?;
        assert!(first.equals(&RegexpExtract::try_new("^(a)(b)", 1)?));
        assert!(!first.equals(&RegexpExtract::try_new("^(a)(b)", 2)?));
        assert!(!first.equals(&RegexpExtract::try_new("^(a)(c)", 1)?));
        assert_eq!(
            first.hash_value(),
            RegexpExtract::try_new("^(a)(b)", 1)?.hash_value()
        );
        Ok(())
    }
}
