//! Order mapping between the local shape and the remote schema
//!
//! Single validated translation in both directions. Pulled records go
//! through [`Order::normalize`]; anything that cannot be mapped (unknown
//! status, unparsable amount, missing creation date) fails closed with
//! [`ClientError::InvalidResponse`].

use chrono::{DateTime, NaiveDateTime, Utc};
use shared::models::CustomerSnapshot;
use shared::order::money;
use shared::order::{
    DeliveryDetails, DeliveryTime, LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus,
    StatusEntry,
};
use std::collections::BTreeMap;

use crate::types::{
    RemoteAddress, RemoteFeeLine, RemoteLineItem, RemoteLineItemPayload, RemoteMeta, RemoteOrder,
    RemoteOrderPayload, RemoteShippingLine, RemoteStatus, RemoteStatusUpdate, meta_value,
};
use crate::{ClientError, ClientResult};

// ============================================================================
// Metadata Keys
// ============================================================================

pub const META_LOCAL_ORDER_ID: &str = "_local_order_id";
pub const META_LOCAL_USER_ID: &str = "_local_user_id";
pub const META_PAYMENT_STATUS: &str = "_local_payment_status";
pub const META_DELIVERY_TIME: &str = "_delivery_time";
pub const META_IMAGE_URLS: &str = "_image_urls";

const SHIPPING_METHOD_ID: &str = "flat_rate";
const DISCOUNT_FEE_NAME: &str = "Discount";

// ============================================================================
// Status / Payment Maps
// ============================================================================

/// Local status → remote status
pub fn remote_status(status: OrderStatus) -> RemoteStatus {
    match status {
        OrderStatus::Pending => RemoteStatus::Pending,
        OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped => {
            RemoteStatus::Processing
        }
        OrderStatus::Delivered | OrderStatus::Completed => RemoteStatus::Completed,
        OrderStatus::Cancelled => RemoteStatus::Cancelled,
    }
}

/// Remote status → local status
pub fn local_status(status: RemoteStatus) -> OrderStatus {
    match status {
        RemoteStatus::Pending
        | RemoteStatus::OnHold
        | RemoteStatus::Failed
        | RemoteStatus::CheckoutDraft => OrderStatus::Pending,
        RemoteStatus::Processing => OrderStatus::Processing,
        RemoteStatus::Completed => OrderStatus::Completed,
        RemoteStatus::Cancelled | RemoteStatus::Refunded => OrderStatus::Cancelled,
    }
}

/// `(payment_method, payment_method_title)` sent to the remote platform
pub fn remote_payment_method(method: PaymentMethod) -> (&'static str, &'static str) {
    match method {
        PaymentMethod::Cod => ("cod", "Cash on Delivery"),
        PaymentMethod::Online => ("online", "Online Payment"),
        PaymentMethod::Pending => ("pending", "Pending"),
    }
}

/// Any gateway other than cash on delivery counts as online
pub fn local_payment_method(method: &str) -> PaymentMethod {
    match method.trim() {
        "cod" => PaymentMethod::Cod,
        "" | "pending" => PaymentMethod::Pending,
        _ => PaymentMethod::Online,
    }
}

/// Payment status of a pulled order.
///
/// The value stored in `_local_payment_status` wins; otherwise a completed
/// order or anything other than cash on delivery is taken as paid.
fn pulled_payment_status(remote: &RemoteOrder, method: PaymentMethod) -> PaymentStatus {
    if let Some(stored) =
        meta_value(&remote.meta_data, META_PAYMENT_STATUS).and_then(|v| PaymentStatus::parse(&v))
    {
        return stored;
    }
    if remote.status == RemoteStatus::Completed || method != PaymentMethod::Cod {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Pending
    }
}

// ============================================================================
// Local → Remote
// ============================================================================

fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

fn line_payload(item: &LineItem) -> ClientResult<RemoteLineItemPayload> {
    let mut meta_data: Vec<RemoteMeta> = item
        .selected_attributes
        .iter()
        .map(|(k, v)| RemoteMeta::text(k.as_str(), v.as_str()))
        .collect();
    if !item.images.is_empty() {
        meta_data.push(RemoteMeta::text(
            META_IMAGE_URLS,
            serde_json::to_string(&item.images)?,
        ));
    }

    let line_total = money::format_amount(money::to_f64(money::line_total(
        item.unit_price,
        item.quantity,
    )));
    Ok(RemoteLineItemPayload {
        product_id: item.product_id,
        name: item.name.clone(),
        quantity: item.quantity,
        subtotal: line_total.clone(),
        total: line_total,
        meta_data,
    })
}

/// Build the create-order payload.
///
/// Fails with [`ClientError::Validation`] before any network call when the
/// customer has no remote id.
pub fn to_remote_payload(
    order: &Order,
    customer: &CustomerSnapshot,
) -> ClientResult<RemoteOrderPayload> {
    let customer_id = customer.remote_customer_id.ok_or_else(|| {
        ClientError::Validation(format!(
            "order {} cannot be pushed without a remote customer id",
            order.id
        ))
    })?;

    let delivery = &order.delivery;
    let (ship_first, ship_last) = split_name(&delivery.name);
    let (bill_first, bill_last) = if customer.first_name.trim().is_empty() {
        (ship_first.clone(), ship_last.clone())
    } else {
        (customer.first_name.clone(), customer.last_name.clone())
    };

    let shipping = RemoteAddress {
        first_name: ship_first,
        last_name: ship_last,
        address_1: delivery.address.clone(),
        city: delivery.city.clone(),
        postcode: delivery.zip.clone(),
        phone: delivery.phone.clone(),
        ..Default::default()
    };
    let billing = RemoteAddress {
        first_name: bill_first,
        last_name: bill_last,
        email: customer.email.clone(),
        ..shipping.clone()
    };

    let line_items = order
        .items
        .iter()
        .map(line_payload)
        .collect::<ClientResult<Vec<_>>>()?;

    let shipping_title = match delivery.delivery_time {
        DeliveryTime::Standard => "Standard Delivery",
        DeliveryTime::Express => "Express Delivery",
    };
    let shipping_lines = vec![RemoteShippingLine {
        method_id: SHIPPING_METHOD_ID.to_string(),
        method_title: shipping_title.to_string(),
        total: money::format_amount(order.delivery_fee),
    }];

    let fee_lines = if order.discount > 0.0 {
        vec![RemoteFeeLine {
            name: DISCOUNT_FEE_NAME.to_string(),
            total: money::format_amount(-order.discount),
        }]
    } else {
        Vec::new()
    };

    let (payment_method, payment_method_title) = remote_payment_method(order.payment_method);

    Ok(RemoteOrderPayload {
        status: remote_status(order.status),
        customer_id,
        payment_method: payment_method.to_string(),
        payment_method_title: payment_method_title.to_string(),
        set_paid: order.payment_status == PaymentStatus::Paid,
        transaction_id: order.transaction_id.clone(),
        customer_note: delivery.notes.clone(),
        billing,
        shipping,
        line_items,
        shipping_lines,
        fee_lines,
        meta_data: vec![
            RemoteMeta::text(META_LOCAL_ORDER_ID, order.id.as_str()),
            RemoteMeta::text(META_LOCAL_USER_ID, order.user_id.as_str()),
            RemoteMeta::text(META_PAYMENT_STATUS, order.payment_status.as_str()),
            RemoteMeta::text(META_DELIVERY_TIME, delivery.delivery_time.as_str()),
        ],
    })
}

/// Build the status update payload
pub fn to_status_update(status: OrderStatus, payment_status: PaymentStatus) -> RemoteStatusUpdate {
    RemoteStatusUpdate {
        status: remote_status(status),
        set_paid: (payment_status == PaymentStatus::Paid).then_some(true),
        meta_data: vec![RemoteMeta::text(META_PAYMENT_STATUS, payment_status.as_str())],
    }
}

// ============================================================================
// Remote → Local
// ============================================================================

fn amount(field: &str, value: &str) -> ClientResult<f64> {
    money::parse_amount(value).ok_or_else(|| {
        ClientError::InvalidResponse(format!("unparsable amount for {}: {:?}", field, value))
    })
}

/// GMT timestamps come without an offset ("2024-05-01T10:00:00")
fn parse_gmt(value: &str) -> ClientResult<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ClientError::InvalidResponse(format!("unparsable date: {:?}", value)))
}

fn line_from_remote(line: &RemoteLineItem) -> ClientResult<LineItem> {
    if line.quantity == 0 {
        return Err(ClientError::InvalidResponse(format!(
            "line item for product {} has zero quantity",
            line.product_id
        )));
    }
    let subtotal = amount("line subtotal", &line.subtotal)?;
    let unit_price = money::unit_price(subtotal, line.quantity);

    let mut selected_attributes = BTreeMap::new();
    let mut images = Vec::new();
    for meta in &line.meta_data {
        if meta.key == META_IMAGE_URLS {
            match meta.as_text().map(|raw| serde_json::from_str::<Vec<String>>(&raw)) {
                Some(Ok(urls)) => images = urls,
                _ => tracing::warn!(
                    product_id = line.product_id,
                    "Ignoring malformed image metadata"
                ),
            }
        } else if !meta.key.starts_with('_') {
            if let Some(value) = meta.as_text() {
                selected_attributes.insert(meta.key.clone(), value);
            }
        }
    }

    Ok(LineItem {
        product_id: line.product_id,
        name: line.name.clone(),
        quantity: line.quantity,
        unit_price,
        selected_attributes,
        images,
    })
}

fn delivery_from_remote(remote: &RemoteOrder) -> DeliveryDetails {
    let source = if remote.shipping.address_1.trim().is_empty() {
        &remote.billing
    } else {
        &remote.shipping
    };
    let name = format!("{} {}", source.first_name, source.last_name)
        .trim()
        .to_string();
    let phone = [&source.phone, &remote.shipping.phone, &remote.billing.phone]
        .into_iter()
        .find(|p| !p.trim().is_empty())
        .cloned()
        .unwrap_or_default();
    let address = if source.address_2.trim().is_empty() {
        source.address_1.clone()
    } else {
        format!("{}, {}", source.address_1, source.address_2)
    };
    let delivery_time = meta_value(&remote.meta_data, META_DELIVERY_TIME)
        .and_then(|v| DeliveryTime::parse(&v))
        .unwrap_or_default();

    DeliveryDetails {
        name,
        phone,
        address,
        city: source.city.clone(),
        zip: source.postcode.clone(),
        notes: remote.customer_note.clone(),
        delivery_time,
    }
}

/// Normalize one remote order into the local shape.
///
/// The remote platform keeps no status history, so the result carries a
/// single entry built from the current status and the creation date.
pub fn from_remote(remote: &RemoteOrder) -> ClientResult<Order> {
    let created_at = remote
        .date_created_gmt
        .as_deref()
        .ok_or_else(|| {
            ClientError::InvalidResponse(format!("order {} has no creation date", remote.id))
        })
        .and_then(parse_gmt)?;
    let updated_at = match remote.date_modified_gmt.as_deref() {
        Some(value) if !value.trim().is_empty() => parse_gmt(value)?,
        _ => created_at,
    };

    let items = remote
        .line_items
        .iter()
        .map(line_from_remote)
        .collect::<ClientResult<Vec<_>>>()?;
    let total = money::sum_lines(items.iter().map(|i| (i.unit_price, i.quantity)));

    let delivery_fee = amount("shipping_total", &remote.shipping_total)?;
    let mut discount = amount("discount_total", &remote.discount_total)?;
    for fee in &remote.fee_lines {
        let value = amount("fee line", &fee.total)?;
        if value < 0.0 {
            discount = money::round2(discount - value);
        }
    }

    let status = local_status(remote.status);
    let payment_method = local_payment_method(&remote.payment_method);
    let payment_status = pulled_payment_status(remote, payment_method);

    let id = meta_value(&remote.meta_data, META_LOCAL_ORDER_ID)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("wc-{}", remote.id));
    let user_id = meta_value(&remote.meta_data, META_LOCAL_USER_ID)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("wc-customer-{}", remote.customer_id));

    Order {
        id,
        remote_id: Some(remote.id),
        user_id,
        items,
        status,
        payment_method,
        payment_status,
        total,
        delivery_fee,
        discount,
        delivery: delivery_from_remote(remote),
        status_history: vec![StatusEntry::new(status, created_at)],
        created_at,
        updated_at,
        transaction_id: Some(remote.transaction_id.clone()),
    }
    .normalize()
    .map_err(|e| ClientError::InvalidResponse(format!("order {}: {}", remote.id, e)))
}
