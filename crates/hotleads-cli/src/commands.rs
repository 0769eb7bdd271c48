use std::time::Duration;

use chrono::Utc;
use hotleads_core::{AppConfig, GeoPoint, NichesFile};
use hotleads_leads::{LeadPipeline, LocationSpec, SearchParams, SearchStatus};
use hotleads_osm::{Geocoder, OsmError};

use crate::render;
use crate::SearchArgs;

/// Loads the niches file, falling back to built-in defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or fails validation.
pub(crate) fn load_niches(config: &AppConfig) -> anyhow::Result<NichesFile> {
    if config.niches_path.exists() {
        Ok(hotleads_core::load_niches(&config.niches_path)?)
    } else {
        tracing::warn!(
            path = %config.niches_path.display(),
            "niches file not found; using built-in defaults"
        );
        Ok(NichesFile::builtin())
    }
}

/// Translates CLI arguments into pipeline parameters.
///
/// # Errors
///
/// Returns an error if a configured niche tag does not parse.
pub(crate) fn search_params(args: &SearchArgs, niches: &NichesFile) -> anyhow::Result<SearchParams> {
    let location = match (&args.location, args.lat, args.lon) {
        (Some(hint), _, _) => LocationSpec::Hint(hint.clone()),
        (None, Some(lat), Some(lon)) => LocationSpec::Point(GeoPoint::new(lat, lon)),
        _ => anyhow::bail!("either --location or both --lat and --lon are required"),
    };

    let categories = if args.all_niches {
        Vec::new()
    } else if args.niches.is_empty() {
        niches.filters()?
    } else {
        args.niches.clone()
    };

    let mut exclusion_list = if args.no_default_blacklist {
        Vec::new()
    } else {
        niches.blacklist.clone()
    };
    exclusion_list.extend(args.blacklist.iter().cloned());

    Ok(SearchParams {
        location,
        radius_m: args.radius,
        categories,
        recency_days: args.days,
        exclusion_list,
        require_no_website: !args.allow_website,
        enrich_contacts: args.enrich,
        probe_websites: args.probe,
    })
}

/// Search for leads and print them.
///
/// # Errors
///
/// Returns an error on configuration problems or when an upstream service fails.
pub(crate) async fn run_leads(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let niches = load_niches(config)?;
    let params = search_params(args, &niches)?;
    if params.enrich_contacts && config.directory_url.is_none() {
        tracing::warn!("--enrich given but HOTLEADS_DIRECTORY_URL is unset; no lookups will run");
    }

    let pipeline = LeadPipeline::from_config(config, &niches)?;
    let report = pipeline.search(&params, Utc::now()).await;

    if let SearchStatus::UpstreamError(detail) = &report.status {
        anyhow::bail!("lead search failed (upstream-error): {detail}");
    }
    if report.widened {
        if let Some(area) = &report.area {
            eprintln!("no leads in the requested area; widened search to {area}");
        }
    }

    println!("{}", render::render_report(&report, args.format)?);
    Ok(())
}

/// Resolve a location hint and print its coordinates.
///
/// # Errors
///
/// Returns an error if the geocoding service is unreachable.
pub(crate) async fn run_geocode(config: &AppConfig, hint: &str) -> anyhow::Result<()> {
    let geocoder = Geocoder::new(
        &config.nominatim_url,
        config.geocode_timeout_secs,
        &config.user_agent,
    )?
    .with_cache(
        config.cache_capacity,
        Duration::from_secs(config.geocode_cache_ttl_secs),
    );

    match geocoder.resolve(hint).await {
        Ok(result) => {
            println!("{}", render::render_geocode(&result));
            Ok(())
        }
        Err(OsmError::NotFound { query }) => {
            println!("location not found: {query}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the Overpass QL for a search without executing it.
///
/// # Errors
///
/// Returns an error on configuration problems or geocoding failure.
pub(crate) async fn run_query(config: &AppConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let niches = load_niches(config)?;
    let params = search_params(args, &niches)?;
    let pipeline = LeadPipeline::from_config(config, &niches)?;

    let (area, specs) = pipeline.plan(&params, Utc::now()).await?;
    println!("// area: {area}");
    for (i, spec) in specs.iter().enumerate() {
        println!(
            "// batch {} of {} ({} clauses)",
            i + 1,
            specs.len(),
            spec.clause_count
        );
        print!("{}", spec.text);
    }
    Ok(())
}
