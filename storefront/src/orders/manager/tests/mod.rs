use super::*;
use crate::services::Session;
use shared::models::CartItem;
use shared::order::history::statuses;
use shared::order::DeliveryTime;
use std::collections::BTreeMap;

struct Harness {
    storage: RecordStorage,
    session: SessionHandle,
    cart: Arc<CartManager>,
    notifier: Notifier,
    manager: OrdersManager,
}

fn create_test_manager() -> Harness {
    create_manager_for(SessionHandle::signed_in(Session::new("u1", "u1@example.com")))
}

fn create_manager_for(session: SessionHandle) -> Harness {
    let storage = RecordStorage::open_in_memory().unwrap();
    let notifier = Notifier::new();
    let cart = Arc::new(CartManager::new(storage.clone(), session.clone(), notifier.clone()).unwrap());
    let manager = OrdersManager::new(
        storage.clone(),
        session.clone(),
        cart.clone(),
        notifier.clone(),
        FeeSchedule::default(),
    )
    .unwrap();
    Harness {
        storage,
        session,
        cart,
        notifier,
        manager,
    }
}

// ========================================================================
// Helper: fill the cart and place an order
// ========================================================================

fn rice(quantity: u32) -> CartItem {
    let mut attrs = BTreeMap::new();
    attrs.insert("Weight".to_string(), "5kg".to_string());
    CartItem {
        product_id: 11,
        name: "Basmati Rice".to_string(),
        quantity,
        unit_price: 750.0,
        selected_attributes: attrs,
        images: vec!["https://cdn.example.com/rice.jpg".to_string()],
    }
}

fn delivery(city: &str, delivery_time: DeliveryTime) -> DeliveryDetails {
    DeliveryDetails {
        name: "Rahim Uddin".to_string(),
        phone: "01700000000".to_string(),
        address: "House 12, Road 3".to_string(),
        city: city.to_string(),
        zip: "1700".to_string(),
        notes: String::new(),
        delivery_time,
    }
}

/// 1500 subtotal to Gazipur, standard delivery
fn place_order(h: &Harness) -> Order {
    h.cart.add(rice(2)).unwrap();
    h.manager
        .create_order(delivery("Gazipur", DeliveryTime::Standard))
        .unwrap()
}

/// Drive an order into a terminal status
fn closed_order(h: &Harness, status: OrderStatus) -> Order {
    let order = place_order(h);
    h.manager.update_order_status(&order.id, status).unwrap()
}

mod test_flows;
