//! Product business logic - Catalog lookups and removal.
//!
//! The catalog is only ever written wholesale by
//! [`crate::core::catalog::populate`]; this module covers the reads orders and
//! clients need, plus single-product deletion for administrators.

use crate::{
    core::{
        parse_uuid,
        tracking::{self, TrackedTable},
    },
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Uuids bound per lookup query, kept well below `SQLite`'s bound-parameter limit
const LOOKUP_CHUNK_SIZE: usize = 500;

/// Retrieves every product, ordered by catalog id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks a product up by its public uuid.
///
/// # Errors
/// Returns [`Error::InvalidUuid`] for a malformed uuid and
/// [`Error::ProductNotFound`] when nothing matches.
pub async fn get_product_by_uuid<C>(db: &C, uuid: &str) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    parse_uuid(uuid)?;
    Product::find()
        .filter(product::Column::Uuid.eq(uuid))
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            context: format!("Product <{uuid}> not found"),
        })
}

/// Fetches the products whose uuids appear in `uuids`, keyed by uuid.
///
/// Unknown uuids are simply absent from the map. Repeated uuids are fetched
/// once and the lookup is split into chunks, so the list may be arbitrarily
/// long.
pub async fn get_products_by_uuids<C>(
    db: &C,
    uuids: &[String],
) -> Result<HashMap<String, product::Model>>
where
    C: ConnectionTrait,
{
    let unique: Vec<&str> = uuids
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut found = HashMap::with_capacity(unique.len());
    for chunk in unique.chunks(LOOKUP_CHUNK_SIZE) {
        let products = Product::find()
            .filter(product::Column::Uuid.is_in(chunk.iter().copied()))
            .all(db)
            .await?;
        found.extend(
            products
                .into_iter()
                .map(|product| (product.uuid.clone(), product)),
        );
    }
    Ok(found)
}

/// Removes one product from the catalog. Bumps `products`.
///
/// Orders that still list the product keep its uuid.
///
/// # Errors
/// Returns [`Error::InvalidUuid`] or [`Error::ProductNotFound`].
pub async fn delete_product(db: &DatabaseConnection, uuid: &str) -> Result<String> {
    parse_uuid(uuid)?;
    let txn = db.begin().await?;

    let result = Product::delete_many()
        .filter(product::Column::Uuid.eq(uuid))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound {
            context: format!("Product <{uuid}> not found"),
        });
    }

    tracking::mark_changed(&txn, TrackedTable::Products).await?;
    txn.commit().await?;

    info!("Deleted product {}", uuid);
    Ok(uuid.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::new_uuid, test_utils::*};

    #[tokio::test]
    async fn test_get_all_products_ordered_by_id() -> Result<()> {
        let db = setup_test_db().await?;
        let second = create_test_product(&db, 2, "Pasta", 1.25).await?;
        let first = create_test_product(&db, 1, "Rice", 2.0).await?;

        let products = get_all_products(&db).await?;
        assert_eq!(products, vec![first, second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_by_uuid() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_product(&db, 1, "Rice", 2.0).await?;

        let found = get_product_by_uuid(&db, &created.uuid).await?;
        assert_eq!(found, created);

        assert!(matches!(
            get_product_by_uuid(&db, &new_uuid()).await,
            Err(Error::ProductNotFound { context: _ })
        ));
        assert!(matches!(
            get_product_by_uuid(&db, "rice").await,
            Err(Error::InvalidUuid { value: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_products_by_uuids_skips_unknown() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_product(&db, 1, "Rice", 2.0).await?;
        let pasta = create_test_product(&db, 2, "Pasta", 1.25).await?;

        let wanted = vec![
            rice.uuid.clone(),
            new_uuid(),
            rice.uuid.clone(),
            pasta.uuid.clone(),
        ];
        let found = get_products_by_uuids(&db, &wanted).await?;
        assert_eq!(found.len(), 2);
        assert_eq!(found[&rice.uuid].price, 2.0);
        assert_eq!(found[&pasta.uuid].price, 1.25);

        assert!(get_products_by_uuids(&db, &[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_products_by_uuids_spans_chunks() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_product(&db, 1, "Rice", 2.0).await?;
        let pasta = create_test_product(&db, 2, "Pasta", 1.25).await?;

        let mut wanted: Vec<String> = (0..LOOKUP_CHUNK_SIZE * 2).map(|_| new_uuid()).collect();
        wanted.push(pasta.uuid.clone());
        wanted.insert(0, rice.uuid.clone());
        wanted.extend(std::iter::repeat_n(rice.uuid.clone(), 40_000));

        let found = get_products_by_uuids(&db, &wanted).await?;
        assert_eq!(found.len(), 2);
        assert_eq!(found[&rice.uuid], rice);
        assert_eq!(found[&pasta.uuid], pasta);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_product(&db, 1, "Rice", 2.0).await?;
        let pasta = create_test_product(&db, 2, "Pasta", 1.25).await?;

        let deleted = delete_product(&db, &rice.uuid).await?;
        assert_eq!(deleted, rice.uuid);
        assert_eq!(get_all_products(&db).await?, vec![pasta]);
        assert_eq!(tracking::read(&db).await?.products.version, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_product_does_not_bump() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            delete_product(&db, &new_uuid()).await,
            Err(Error::ProductNotFound { context: _ })
        ));
        assert!(matches!(
            delete_product(&db, "42").await,
            Err(Error::InvalidUuid { value: _ })
        ));
        assert_eq!(tracking::read(&db).await?.products.version, 0);
        Ok(())
    }
}
