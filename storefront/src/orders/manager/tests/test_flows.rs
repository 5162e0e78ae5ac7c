use super::*;
use shared::order::StatusEntry;


// ========================================================================
// Checkout flows
// ========================================================================

#[test]
fn test_cod_checkout_to_completion() {
    let h = create_test_manager();
    let order = place_order(&h);

    h.manager
        .confirm_order(&order.id, PaymentMethod::Cod, None)
        .unwrap();
    h.manager
        .update_order_status(&order.id, OrderStatus::Shipped)
        .unwrap();
    h.manager
        .update_order_status(&order.id, OrderStatus::Delivered)
        .unwrap();
    // cash collected at the door
    h.manager
        .update_payment_status(&order.id, PaymentStatus::Paid, None)
        .unwrap();
    let done = h
        .manager
        .update_order_status(&order.id, OrderStatus::Completed)
        .unwrap();

    assert_eq!(done.payment_status, PaymentStatus::Paid);
    assert_eq!(
        statuses(&done.status_history),
        vec![
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ]
    );
    assert!(h.manager.cancel_order(&order.id).is_err());
}


#[test]
fn test_online_checkout_with_late_payment() {
    let h = create_test_manager();
    let order = place_order(&h);

    // provider redirect, no result yet
    h.manager
        .confirm_order(&order.id, PaymentMethod::Online, None)
        .unwrap();
    // provider callback
    let paid = h
        .manager
        .update_payment_status(&order.id, PaymentStatus::Paid, Some(PaymentDetails::paid("TX-88")))
        .unwrap();

    assert_eq!(paid.status, OrderStatus::Processing);
    assert_eq!(paid.payment_method, PaymentMethod::Online);
    assert_eq!(paid.transaction_id.as_deref(), Some("TX-88"));
}


#[test]
fn test_status_history_never_duplicates() {
    let h = create_test_manager();
    let order = place_order(&h);

    h.manager
        .update_order_status(&order.id, OrderStatus::Processing)
        .unwrap();
    h.manager
        .update_order_status(&order.id, OrderStatus::Shipped)
        .unwrap();
    let back = h
        .manager
        .update_order_status(&order.id, OrderStatus::Processing)
        .unwrap();

    assert_eq!(back.status, OrderStatus::Processing);
    assert_eq!(back.status_history.len(), 3);
    // the repeated status carries the later timestamp
    assert_eq!(back.status_history.last().unwrap().status, OrderStatus::Processing);
}


// ========================================================================
// Remote merge
// ========================================================================

fn remote_copy(order: &Order, remote_id: u64, status: OrderStatus) -> Order {
    let mut remote = order.clone();
    remote.id = format!("wc-{}", remote_id);
    remote.remote_id = Some(remote_id);
    remote.user_id = "wc-customer-42".to_string();
    remote.status = status;
    remote.status_history = vec![StatusEntry::new(status, shared::util::now())];
    remote
}


#[test]
fn test_merge_remote_updates_and_adds() {
    let h = create_test_manager();
    let order = place_order(&h);
    h.manager.attach_remote_id("u1", &order.id, 501).unwrap();

    let shipped = remote_copy(&order, 501, OrderStatus::Shipped);
    let web_order = remote_copy(&order, 777, OrderStatus::Processing);

    let summary = h
        .manager
        .merge_remote("u1", vec![shipped, web_order])
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.added, 1);

    let local = h.manager.get_order(&order.id).unwrap();
    assert_eq!(local.status, OrderStatus::Shipped);
    assert_eq!(
        statuses(&local.status_history),
        vec![OrderStatus::Pending, OrderStatus::Shipped]
    );
    let added = h.manager.get_order("wc-777").unwrap();
    assert_eq!(added.user_id, "u1");

    // persisted
    h.manager.reload().unwrap();
    assert_eq!(h.manager.orders().len(), 2);
}


#[test]
fn test_merge_remote_twice_is_stable() {
    let h = create_test_manager();
    let order = place_order(&h);
    h.manager.attach_remote_id("u1", &order.id, 501).unwrap();
    let pull = vec![remote_copy(&order, 501, OrderStatus::Completed)];

    h.manager.merge_remote("u1", pull.clone()).unwrap();
    let once = h.manager.orders();
    let second = h.manager.merge_remote("u1", pull).unwrap();

    assert!(!second.changed());
    assert_eq!(h.manager.orders(), once);
}


#[test]
fn test_merged_terminal_order_is_closed() {
    let h = create_test_manager();
    let order = place_order(&h);
    h.manager.attach_remote_id("u1", &order.id, 501).unwrap();
    h.manager
        .merge_remote("u1", vec![remote_copy(&order, 501, OrderStatus::Cancelled)])
        .unwrap();

    let err = h
        .manager
        .confirm_order(&order.id, PaymentMethod::Cod, None)
        .unwrap_err();
    assert!(matches!(err, ManagerError::OrderClosed { status: OrderStatus::Cancelled, .. }));
}


// ========================================================================
// Account switch while a sync is in flight
// ========================================================================

fn switch_to_bob(h: &Harness) {
    h.session.sign_in(Session::new("bob", "bob@example.com"));
    h.manager.reload().unwrap();
}


#[test]
fn test_merge_for_previous_user_is_rejected() {
    let h = create_test_manager();
    let order = place_order(&h);
    let pull = vec![remote_copy(&order, 77, OrderStatus::Processing)];

    switch_to_bob(&h);
    let mut notices = h.notifier.subscribe();
    let err = h.manager.merge_remote("u1", pull).unwrap_err();

    assert!(matches!(err, ManagerError::SessionChanged { ref expected } if expected == "u1"));
    assert!(h.manager.orders().is_empty());
    assert!(h.storage.load::<Vec<Order>>("bob", RecordKind::Orders).unwrap().is_none());
    // nothing shown to bob
    assert!(notices.try_recv().is_err());
}


#[test]
fn test_remote_id_kept_for_previous_user() {
    let h = create_test_manager();
    let order = place_order(&h);

    switch_to_bob(&h);
    let stored = h.manager.attach_remote_id("u1", &order.id, 501).unwrap();
    assert_eq!(stored.remote_id, Some(501));
    assert!(h.manager.orders().is_empty());

    h.session.sign_in(Session::new("u1", "u1@example.com"));
    h.manager.reload().unwrap();
    assert_eq!(h.manager.get_order(&order.id).unwrap().remote_id, Some(501));
    assert!(h.manager.unsynced_orders().is_empty());
}


#[test]
fn test_remote_id_for_previous_user_unknown_order() {
    let h = create_test_manager();
    place_order(&h);
    h.session.sign_out();
    h.manager.reload().unwrap();

    let err = h.manager.attach_remote_id("u1", "ORD-missing", 9).unwrap_err();
    assert!(matches!(err, ManagerError::OrderNotFound(_)));
}
