use crate::attribute_value::{decode_map, DecodeError};
use crate::core::{is_truthy, ChangeRecord, CustomRecord, NormalizedRecord, RawOrder};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("record is not an object: `{0}`")]
    RecordNotAnObject(String),
    #[error("custom record has no `order` field")]
    MissingOrder,
    #[error("order is not an object: `{0}`")]
    OrderNotAnObject(String),
    #[error("`dynamodb` is not an object: `{0}`")]
    ChangeNotAnObject(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("could not convert amount to a number: `{0}`")]
    InvalidAmount(String),
}

/// An order pulled out of a record together with its coerced amount.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedOrder {
    pub order: RawOrder,
    pub amount: f64,
}

/// Pulls the order out of a record.
///
/// `Ok(None)` means the record carries no order data at all, which is a skip rather than a
/// failure.
pub fn extract(record: &NormalizedRecord) -> Result<Option<ExtractedOrder>, ExtractionError> {
    let order = match record {
        NormalizedRecord::Custom(custom) => custom_order(custom)?,
        NormalizedRecord::Change(change) => change_order(change)?,
    };

    match order {
        Some(order) => {
            let amount = coerce_amount(order.get("amount"))?;
            Ok(Some(ExtractedOrder { order, amount }))
        }
        None => Ok(None),
    }
}

fn custom_order(record: &CustomRecord) -> Result<Option<RawOrder>, ExtractionError> {
    match &record.order {
        None => Err(ExtractionError::MissingOrder),
        Some(order) if !is_truthy(order) => Ok(None),
        Some(Value::Object(fields)) => Ok(Some(RawOrder::new(fields.clone()))),
        Some(other) => Err(ExtractionError::OrderNotAnObject(other.to_string())),
    }
}

fn change_order(record: &ChangeRecord) -> Result<Option<RawOrder>, ExtractionError> {
    let fields = record
        .as_value()
        .as_object()
        .ok_or_else(|| ExtractionError::RecordNotAnObject(record.as_value().to_string()))?;

    let images = match fields.get("dynamodb") {
        None => return Ok(None),
        Some(Value::Object(images)) => images,
        Some(other) => return Err(ExtractionError::ChangeNotAnObject(other.to_string())),
    };

    // OldImage is only looked at when NewImage yields nothing.
    if let Some(new_image) = decode_map(images.get("NewImage"))? {
        return Ok(Some(RawOrder::new(new_image)));
    }
    Ok(decode_map(images.get("OldImage"))?.map(RawOrder::new))
}

fn coerce_amount(amount: Option<&Value>) -> Result<f64, ExtractionError> {
    match amount {
        None => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ExtractionError::InvalidAmount(n.to_string())),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ExtractionError::InvalidAmount(s.clone())),
        Some(other) => Err(ExtractionError::InvalidAmount(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{extract, ExtractionError};
    use crate::attribute_value::DecodeError;
    use crate::core::{ChangeRecord, NormalizedRecord};
    use serde_json::json;

    fn change(value: serde_json::Value) -> NormalizedRecord {
        NormalizedRecord::from(value)
    }

    #[test]
    fn when_custom_record_has_order_should_return_it_with_amount() {
        let record = NormalizedRecord::custom(json!({"orderId": "o1", "amount": 150}));

        let extracted = extract(&record).unwrap().unwrap();

        assert_eq!(extracted.amount, 150.0);
        assert_eq!(extracted.order.order_id(), Some(&json!("o1")));
    }

    #[test]
    fn when_custom_record_has_no_order_should_fail() {
        let record = change(json!({"custom": true}));

        assert_eq!(extract(&record), Err(ExtractionError::MissingOrder));
    }

    #[test]
    fn when_custom_order_is_empty_should_be_absent() {
        for order in [json!({}), json!(null), json!([]), json!(""), json!(0), json!(false)] {
            assert_eq!(extract(&NormalizedRecord::custom(order)), Ok(None));
        }
    }

    #[test]
    fn when_custom_order_is_not_an_object_should_fail() {
        assert!(matches!(
            extract(&NormalizedRecord::custom(json!("o1"))),
            Err(ExtractionError::OrderNotAnObject(_))
        ));
        assert!(matches!(
            extract(&NormalizedRecord::custom(json!([{"orderId": "o1"}]))),
            Err(ExtractionError::OrderNotAnObject(_))
        ));
    }

    #[test]
    fn when_change_has_new_image_should_decode_it() {
        let record = change(json!({
            "dynamodb": {
                "NewImage": {"orderId": {"S": "o2"}, "amount": {"N": "50"}},
                "OldImage": {"orderId": {"S": "old"}}
            }
        }));

        let extracted = extract(&record).unwrap().unwrap();

        assert_eq!(extracted.order.order_id(), Some(&json!("o2")));
        assert_eq!(extracted.amount, 50.0);
    }

    #[test]
    fn when_change_has_only_old_image_should_fall_back_to_it() {
        let record = NormalizedRecord::Change(ChangeRecord::from_stream(
            json!({"NewImage": {}, "OldImage": {"orderId": {"S": "o9"}, "amount": {"N": "120.5"}}}),
            Some(json!("REMOVE")),
        ));

        let extracted = extract(&record).unwrap().unwrap();

        assert_eq!(extracted.order.order_id(), Some(&json!("o9")));
        assert_eq!(extracted.amount, 120.5);
    }

    #[test]
    fn when_new_image_is_usable_should_ignore_malformed_old_image() {
        let record = change(json!({
            "dynamodb": {
                "NewImage": {"orderId": {"S": "o2"}},
                "OldImage": {"orderId": {"BAD": "x"}}
            }
        }));

        assert!(extract(&record).unwrap().is_some());
    }

    #[test]
    fn when_change_has_no_images_should_be_absent() {
        assert_eq!(extract(&change(json!({"dynamodb": {}}))), Ok(None));
        assert_eq!(extract(&change(json!({"eventName": "MODIFY"}))), Ok(None));
    }

    #[test]
    fn when_change_record_is_not_an_object_should_fail() {
        assert!(matches!(
            extract(&change(json!("garbage"))),
            Err(ExtractionError::RecordNotAnObject(_))
        ));
        assert!(matches!(
            extract(&change(json!({"dynamodb": null}))),
            Err(ExtractionError::ChangeNotAnObject(_))
        ));
    }

    #[test]
    fn when_image_has_bad_number_should_surface_decode_error() {
        let record = change(json!({"dynamodb": {"NewImage": {"amount": {"N": "not-a-number"}}}}));

        assert!(matches!(
            extract(&record),
            Err(ExtractionError::Decode(DecodeError::Field { .. }))
        ));
    }

    #[test]
    fn when_amount_is_missing_should_default_to_zero() {
        let record = NormalizedRecord::custom(json!({"orderId": "o1"}));

        assert_eq!(extract(&record).unwrap().unwrap().amount, 0.0);
    }

    #[test]
    fn when_amount_is_numeric_string_should_coerce_it() {
        let record = NormalizedRecord::custom(json!({"orderId": "o1", "amount": " 100.01 "}));

        assert_eq!(extract(&record).unwrap().unwrap().amount, 100.01);
    }

    #[test]
    fn when_amount_is_not_coercible_should_fail() {
        for amount in [json!("lots"), json!(null), json!([1]), json!({"value": 1})] {
            let record = NormalizedRecord::custom(json!({"orderId": "o1", "amount": amount}));

            assert!(matches!(
                extract(&record),
                Err(ExtractionError::InvalidAmount(_))
            ));
        }
    }
}
