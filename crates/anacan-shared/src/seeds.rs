//! Demo content inserted by the seed loader.
//!
//! Records are keyed by a natural key (slug, email, or a field pair) so the
//! loader can skip those already present. Categories carry fixed document ids
//! because posts reference them.

use serde_json::json;

use crate::constants::*;
use crate::types::SeedRecord;

pub fn seed_catalog() -> Vec<SeedRecord> {
    let mut seeds = categories();
    seeds.extend(pages());
    seeds.extend(forums());
    seeds.extend(posts());
    seeds.extend(subscribers());
    seeds
}

fn categories() -> Vec<SeedRecord> {
    [
        ("hamilelik", "Hamiləlik", "Беременность", "baby-bottle", 1),
        ("yenidogulmus", "Yenidoğulmuş", "Новорождённый", "baby", 2),
        ("qidalanma", "Qidalanma", "Питание", "apple", 3),
        ("saglamliq", "Sağlamlıq", "Здоровье", "heart", 4),
        ("inkisaf", "İnkişaf", "Развитие", "puzzle", 5),
    ]
    .into_iter()
    .map(|(slug, name_az, name_ru, icon, order)| {
        SeedRecord::new(
            COLLECTION_CATEGORIES,
            &["slug"],
            json!({
                "slug": slug,
                "name_az": name_az,
                "name_ru": name_ru,
                "icon": icon,
                "sort_order": order,
                "is_active": true,
            }),
        )
        .with_id(slug)
    })
    .collect()
}

fn pages() -> Vec<SeedRecord> {
    vec![
        SeedRecord::new(
            COLLECTION_PAGES,
            &["slug"],
            json!({
                "slug": "haqqimizda",
                "title": "Haqqımızda",
                "content": "Anacan.az valideynlər üçün etibarlı məlumat mənbəyidir.",
                "language": "az",
                "status": "published",
            }),
        ),
        SeedRecord::new(
            COLLECTION_PAGES,
            &["slug"],
            json!({
                "slug": "elaqe",
                "title": "Əlaqə",
                "content": "Bizimlə info@anacan.az ünvanı ilə əlaqə saxlayın.",
                "language": "az",
                "status": "published",
            }),
        ),
        SeedRecord::new(
            COLLECTION_PAGES,
            &["slug"],
            json!({
                "slug": "mexfilik-siyaseti",
                "title": "Məxfilik siyasəti",
                "content": "Şəxsi məlumatlarınız üçüncü tərəflərlə paylaşılmır.",
                "language": "az",
                "status": "published",
            }),
        ),
    ]
}

fn forums() -> Vec<SeedRecord> {
    [
        ("hamilelik-sohbetleri", "Hamiləlik söhbətləri", 1),
        ("ana-suedu", "Ana südü və qidalanma", 2),
        ("yuxu-rejimi", "Yuxu rejimi", 3),
    ]
    .into_iter()
    .map(|(slug, name, order)| {
        SeedRecord::new(
            COLLECTION_FORUMS,
            &["slug"],
            json!({
                "slug": slug,
                "name": name,
                "description": format!("{name} mövzusunda valideynlərin müzakirəsi"),
                "is_active": true,
                "sort_order": order,
            }),
        )
    })
    .collect()
}

fn posts() -> Vec<SeedRecord> {
    [
        (
            "hamileliyin-ilk-trimestri",
            "Hamiləliyin ilk trimestri: nələri bilməlisiniz",
            "hamilelik",
            "İlk üç ayda bədəndə baş verən dəyişikliklər və həkim müayinələri.",
            "2024-01-15T09:00:00.000+00:00",
        ),
        (
            "yenidogulmusun-yuxusu",
            "Yenidoğulmuşun yuxusu necə tənzimlənir",
            "yenidogulmus",
            "Körpənin gündəlik yuxu ritmi və təhlükəsiz yatma qaydaları.",
            "2024-02-03T09:00:00.000+00:00",
        ),
        (
            "ilk-elave-qida",
            "İlk əlavə qidaya keçid",
            "qidalanma",
            "Altı aylıqdan sonra menyuya hansı qidalar daxil edilir.",
            "2024-02-20T09:00:00.000+00:00",
        ),
        (
            "peyvend-teqvimi",
            "Uşaqlar üçün peyvənd təqvimi",
            "saglamliq",
            "Milli peyvənd təqvimi və hər peyvəndin vaxtı.",
            "2024-03-11T09:00:00.000+00:00",
        ),
    ]
    .into_iter()
    .map(|(slug, title, category, excerpt, published_at)| {
        SeedRecord::new(
            COLLECTION_POSTS,
            &["slug"],
            json!({
                "slug": slug,
                "title": title,
                "category_id": category,
                "excerpt": excerpt,
                "content": format!("<p>{excerpt}</p>"),
                "author_name": "Anacan redaksiyası",
                "language": "az",
                "status": "published",
                "tags": [category],
                "featured": false,
                "reading_time": 5,
                "published_at": published_at,
            }),
        )
    })
    .collect()
}

fn subscribers() -> Vec<SeedRecord> {
    vec![SeedRecord::new(
        COLLECTION_SUBSCRIBERS,
        &["email"],
        json!({
            "email": "demo@anacan.az",
            "language": "az",
            "is_confirmed": true,
        }),
    )]
}
