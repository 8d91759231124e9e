use crate::{
    db_types::{NewProduct, NewUser, Product, Role, Rupiah, Seller, User},
    traits::CatalogManagement,
};

/// A small catalogue: one buyer, one store with three products, and a second store with one product.
#[derive(Debug, Clone)]
pub struct Storefront {
    pub buyer: User,
    pub admin: User,
    pub seller_user: User,
    pub seller: Seller,
    pub other_seller_user: User,
    pub other_seller: Seller,
    /// Kopi Tubruk, Rp 15.000
    pub tubruk: Product,
    /// Kopi Susu Gula Aren, Rp 22.000
    pub gula_aren: Product,
    /// Roti Bakar, Rp 12.000
    pub roti: Product,
    /// Sold by `other_seller`. Kopi Luwak, Rp 75.000
    pub luwak: Product,
}

pub async fn seed_storefront<B: CatalogManagement>(db: &B) -> Storefront {
    let buyer = db.insert_user(NewUser::new("Budi", "budi@example.com", Role::User)).await.expect("insert buyer");
    let admin = db.insert_user(NewUser::new("Ani", "ani@example.com", Role::Admin)).await.expect("insert admin");
    let seller_user =
        db.insert_user(NewUser::new("Sari", "sari@example.com", Role::Seller)).await.expect("insert seller user");
    let seller = db.insert_seller(seller_user.id, "Warung Kopi Sari").await.expect("insert seller");
    let other_seller_user =
        db.insert_user(NewUser::new("Joko", "joko@example.com", Role::Seller)).await.expect("insert seller user");
    let other_seller = db.insert_seller(other_seller_user.id, "Luwak Joko").await.expect("insert seller");
    let drinks = db.insert_category("Minuman").await.expect("insert category");
    let cup = db.insert_unit("gelas").await.expect("insert unit");
    let tubruk = db
        .insert_product(NewProduct::new(seller.id, "Kopi Tubruk", Rupiah::from(15_000)).with_category(drinks).with_unit(cup))
        .await
        .expect("insert product");
    let gula_aren = db
        .insert_product(
            NewProduct::new(seller.id, "Kopi Susu Gula Aren", Rupiah::from(22_000)).with_category(drinks).with_unit(cup),
        )
        .await
        .expect("insert product");
    let roti = db.insert_product(NewProduct::new(seller.id, "Roti Bakar", Rupiah::from(12_000))).await.expect("insert");
    let luwak = db
        .insert_product(NewProduct::new(other_seller.id, "Kopi Luwak", Rupiah::from(75_000)).with_category(drinks))
        .await
        .expect("insert product");
    Storefront { buyer, admin, seller_user, seller, other_seller_user, other_seller, tubruk, gula_aren, roti, luwak }
}
