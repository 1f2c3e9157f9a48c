use anyhow::Context;

use crate::alerts::{NoticeKind, SubscriptionForm, UnsubscribeRequest};
use crate::api::{ApiClient, OverpassClient};
use crate::cli::{ApiArgs, HeatmapArgs, HospitalsArgs, PredictArgs, SubscribeArgs, UnsubscribeArgs};
use crate::download::load_cases;
use crate::gazetteer::Gazetteer;
use crate::geo::Coordinate;
use crate::heatmap::{HeatmapPolicy, HeatmapView};
use crate::prediction::{Assessment, PREDICTION_FAILED, PredictRequest};

pub async fn hospitals(opts: HospitalsArgs) -> anyhow::Result<()> {
    let origin = Coordinate::new(opts.lat, opts.lon);
    let client = OverpassClient::new(&opts.overpass.overpass_url, opts.overpass.radius_m)?;
    let ranked = client
        .ranked_near(origin)
        .await
        .context("Error fetching hospital data")?;

    if ranked.is_empty() {
        println!("No hospitals within {} m.", opts.overpass.radius_m);
        return Ok(());
    }
    for (i, h) in ranked.iter().take(opts.limit).enumerate() {
        println!("{:>2}. {} ({})", i + 1, h.poi.name, h.distance_label());
        if !h.poi.address.is_empty() {
            println!("    {}", h.poi.address);
        }
        println!("    {}  (osm node {})", h.maps_url(), h.poi.id);
    }
    Ok(())
}

pub async fn heatmap(opts: HeatmapArgs) -> anyhow::Result<()> {
    let dataset = load_cases(&opts.dataset).await?;
    let view = HeatmapView::build(
        &HeatmapPolicy::default(),
        &dataset,
        &Gazetteer::bangalore(),
        opts.year,
    );

    println!("Dengue cases heatmap - {}", view.year);
    if view.markers.is_empty() {
        let years = dataset
            .years()
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("No mapped areas for {}. Years available: {years}", view.year);
        return Ok(());
    }
    for m in &view.markers {
        println!(
            "{:<16} {:>6} cases  radius {:>7.1} m  {:?}",
            m.area, m.cases, m.radius_m, m.severity
        );
    }
    Ok(())
}

pub async fn locations(opts: ApiArgs) -> anyhow::Result<()> {
    let api = ApiClient::new(&opts.api_base)?;
    for loc in api.locations().await {
        println!("{loc}");
    }
    Ok(())
}

pub async fn predict(opts: PredictArgs) -> anyhow::Result<()> {
    let api = ApiClient::new(&opts.api.api_base)?;
    let req = PredictRequest {
        location: opts.location,
        month: opts.month,
        year: opts.year,
    };
    let prediction = api.predict(&req).await.context(PREDICTION_FAILED)?;
    let a = Assessment::new(&req, &prediction);
    println!(
        "Estimated dengue cases in {} for {} {}: {}",
        a.location, a.month, a.year, a.prediction
    );
    println!("{}", a.label);
    println!("{}", a.recommendation);
    Ok(())
}

pub async fn subscribe(opts: SubscribeArgs) -> anyhow::Result<()> {
    let api = ApiClient::new(&opts.api.api_base)?;
    let form = SubscriptionForm {
        name: opts.name,
        email: opts.email,
        mobile: opts.mobile,
        location: opts.location,
        alert_frequency: opts.frequency,
    };
    report(api.submit_subscription(&form).await)
}

pub async fn unsubscribe(opts: UnsubscribeArgs) -> anyhow::Result<()> {
    let api = ApiClient::new(&opts.api.api_base)?;
    report(api.submit_unsubscribe(&UnsubscribeRequest { email: opts.email }).await)
}

fn report(notice: crate::alerts::Notice) -> anyhow::Result<()> {
    println!("{notice}");
    if notice.kind == NoticeKind::Error {
        anyhow::bail!("{}", notice.text);
    }
    Ok(())
}
