//! Pure order payload construction.

use crate::catalog::{Address, Buyer, Screen, Sku, TicketProject};

use super::types::{
    DeliverInfo, OrderError, OrderPayload, OrderSelection, PhoneNameOrder, StandardOrder,
};

/// Separator for the flat buyer name and phone strings.
const JOIN_SEPARATOR: &str = ", ";

/// Platform order type for a regular ticket purchase.
const ORDER_TYPE_TICKET: u8 = 1;

/// Build the order payload for a selection.
///
/// The variant follows the project's `require_phone_name` flag. The captcha
/// solution is attached later with [`OrderPayload::attach_captcha`].
pub fn build_order(
    project: &TicketProject,
    selection: &OrderSelection,
    buyers: &[Buyer],
    addresses: &[Address],
) -> Result<OrderPayload, OrderError> {
    if selection.buyer_indices.is_empty() {
        return Err(OrderError::NoBuyers);
    }

    let screen = pick_screen(project, selection.screen_index)?;
    let sku = pick_sku(screen, selection.sku_index)?;
    let selected = pick_buyers(buyers, &selection.buyer_indices)?;
    let address = addresses.get(selection.address_index).ok_or_else(|| {
        OrderError::InvalidSelection(format!(
            "address {} out of range ({} saved)",
            selection.address_index,
            addresses.len()
        ))
    })?;

    let count = u32::try_from(selected.len()).map_err(|_| OrderError::PriceOverflow)?;
    let pay_money = sku
        .price
        .checked_mul(u64::from(count))
        .ok_or(OrderError::PriceOverflow)?;

    let names = join(selected.iter().map(|b| b.name.as_str()));
    let phones = join(selected.iter().map(|b| b.tel.as_str()));

    let order = StandardOrder {
        detail: detail_line(screen, sku),
        count,
        screen_id: screen.id,
        project_id: project.id,
        sku_id: sku.id,
        order_type: ORDER_TYPE_TICKET,
        pay_money,
        buyer_info: selected,
        buyer: names.clone(),
        tel: phones.clone(),
        deliver_info: DeliverInfo {
            name: address.name.clone(),
            tel: address.phone.clone(),
            addr_id: address.id,
            addr: address.addr.clone(),
        },
    };

    if project.require_phone_name {
        Ok(OrderPayload::PhoneName(PhoneNameOrder {
            order,
            phone: phones,
            name: names,
        }))
    } else {
        Ok(OrderPayload::Standard(order))
    }
}

fn pick_screen(project: &TicketProject, index: usize) -> Result<&Screen, OrderError> {
    project.screens.get(index).ok_or_else(|| {
        OrderError::InvalidSelection(format!(
            "screen {} out of range ({} available)",
            index,
            project.screens.len()
        ))
    })
}

fn pick_sku(screen: &Screen, index: usize) -> Result<&Sku, OrderError> {
    screen.skus.get(index).ok_or_else(|| {
        OrderError::InvalidSelection(format!(
            "ticket tier {} out of range ({} in screen {})",
            index,
            screen.skus.len(),
            screen.id
        ))
    })
}

fn pick_buyers(buyers: &[Buyer], indices: &[usize]) -> Result<Vec<Buyer>, OrderError> {
    let mut selected = Vec::with_capacity(indices.len());
    for (position, &index) in indices.iter().enumerate() {
        if indices[..position].contains(&index) {
            return Err(OrderError::InvalidSelection(format!(
                "buyer {} selected twice",
                index
            )));
        }
        let buyer = buyers.get(index).ok_or_else(|| {
            OrderError::InvalidSelection(format!(
                "buyer {} out of range ({} saved)",
                index,
                buyers.len()
            ))
        })?;
        selected.push(buyer.clone());
    }
    Ok(selected)
}

fn join<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(JOIN_SEPARATOR)
}

fn detail_line(screen: &Screen, sku: &Sku) -> String {
    format!(
        "{} - {} - ￥{} - {} - 【起售时间：{}】",
        screen.name,
        sku.desc,
        sku.price,
        sku.sale_flag,
        sku.sale_start.as_deref().unwrap_or_default()
    )
}
