//! Vendor bootstrap snippets for the trackers configured on a SmartLink.
//!
//! A tracker is emitted only when it is enabled AND carries a non-blank id.

use crate::domain::entities::{AnalyticsConfig, ScriptPosition};
use crate::render::escape::{js_string, query_param};

/// Markup injected into `<head>` and at the end of `<body>`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnalyticsMarkup {
    pub head: String,
    pub body: String,
}

/// Builds the tracker snippets for a page.
///
/// `page_title` and `country` are forwarded to GA4 as page properties.
pub fn analytics_markup(analytics: &AnalyticsConfig, page_title: &str, country: &str) -> AnalyticsMarkup {
    let mut head = Vec::new();
    let mut body = Vec::new();

    let ga4 = analytics.ga4.active_id();
    let ads = analytics.google_ads.active_id();

    // One gtag.js loader serves both GA4 and Google Ads.
    if let Some(loader_id) = ga4.or(ads) {
        let mut script = format!(
            "<script async src=\"https://www.googletagmanager.com/gtag/js?id={}\"></script>\n\
             <script>\n\
             window.dataLayer = window.dataLayer || [];\n\
             function gtag(){{dataLayer.push(arguments);}}\n\
             gtag('js', new Date());\n",
            query_param(loader_id)
        );
        if let Some(id) = ga4 {
            script.push_str(&format!(
                "gtag('config', {}, {{ page_title: {}, custom_map: {{ 'smartlink_id': 'custom_parameter_1' }}, user_properties: {{ 'country': {} }} }});\n",
                js_string(id),
                js_string(page_title),
                js_string(country)
            ));
        }
        if let Some(id) = ads {
            script.push_str(&format!("gtag('config', {});\n", js_string(id)));
        }
        script.push_str("</script>");
        head.push(script);
    }

    if let Some(id) = analytics.gtm.active_id() {
        head.push(format!(
            "<script>(function(w,d,s,l,i){{w[l]=w[l]||[];w[l].push({{'gtm.start':\n\
             new Date().getTime(),event:'gtm.js'}});var f=d.getElementsByTagName(s)[0],\n\
             j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=\n\
             'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);\n\
             }})(window,document,'script','dataLayer',{});</script>",
            js_string(id)
        ));
        body.push(format!(
            "<noscript><iframe src=\"https://www.googletagmanager.com/ns.html?id={}\" height=\"0\" width=\"0\" style=\"display:none;visibility:hidden\"></iframe></noscript>",
            query_param(id)
        ));
    }

    if let Some(id) = analytics.meta_pixel.active_id() {
        head.push(format!(
            "<script>\n\
             !function(f,b,e,v,n,t,s)\n\
             {{if(f.fbq)return;n=f.fbq=function(){{n.callMethod?\n\
             n.callMethod.apply(n,arguments):n.queue.push(arguments)}};\n\
             if(!f._fbq)f._fbq=n;n.push=n;n.loaded=!0;n.version='2.0';\n\
             n.queue=[];t=b.createElement(e);t.async=!0;\n\
             t.src=v;s=b.getElementsByTagName(e)[0];\n\
             s.parentNode.insertBefore(t,s)}}(window, document,'script',\n\
             'https://connect.facebook.net/en_US/fbevents.js');\n\
             fbq('init', {});\n\
             fbq('track', 'PageView');\n\
             </script>",
            js_string(id)
        ));
        body.push(format!(
            "<noscript><img height=\"1\" width=\"1\" style=\"display:none\" src=\"https://www.facebook.com/tr?id={}&amp;ev=PageView&amp;noscript=1\"/></noscript>",
            query_param(id)
        ));
    }

    if let Some(id) = analytics.tiktok_pixel.active_id() {
        head.push(format!(
            "<script>\n\
             !function (w, d, t) {{\n\
             w.TiktokAnalyticsObject=t;var ttq=w[t]=w[t]||[];ttq.methods=[\"page\",\"track\",\"identify\",\"instances\",\"debug\",\"on\",\"off\",\"once\",\"ready\",\"alias\",\"group\",\"enableCookie\",\"disableCookie\"],ttq.setAndDefer=function(t,e){{t[e]=function(){{t.push([e].concat(Array.prototype.slice.call(arguments,0)))}}}};for(var i=0;i<ttq.methods.length;i++)ttq.setAndDefer(ttq,ttq.methods[i]);ttq.instance=function(t){{for(var e=ttq._i[t]||[],n=0;n<ttq.methods.length;n++)ttq.setAndDefer(e,ttq.methods[n]);return e}},ttq.load=function(e,n){{var i=\"https://analytics.tiktok.com/i18n/pixel/events.js\";ttq._i=ttq._i||{{}},ttq._i[e]=[],ttq._i[e]._u=i,ttq._t=ttq._t||{{}},ttq._t[e]=+new Date,ttq._o=ttq._o||{{}},ttq._o[e]=n||{{}};var o=document.createElement(\"script\");o.type=\"text/javascript\",o.async=!0,o.src=i+\"?sdkid=\"+e+\"&lib=\"+t;var a=document.getElementsByTagName(\"script\")[0];a.parentNode.insertBefore(o,a)}};\n\
             ttq.load({});\n\
             ttq.page();\n\
             }}(window, document, 'ttq');\n\
             </script>",
            js_string(id)
        ));
    }

    for custom in &analytics.custom_scripts {
        match custom.position {
            ScriptPosition::Head => head.push(custom.script.clone()),
            ScriptPosition::Body => body.push(custom.script.clone()),
        }
    }

    AnalyticsMarkup {
        head: head.join("\n"),
        body: body.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CustomScript, TrackerConfig};

    fn tracker(enabled: bool, id: &str) -> TrackerConfig {
        TrackerConfig {
            enabled,
            id: Some(id.to_string()),
        }
    }

    #[test]
    fn test_ga4_enabled_with_empty_id_is_not_emitted() {
        let analytics = AnalyticsConfig {
            ga4: tracker(true, ""),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(!markup.head.contains("googletagmanager.com/gtag/js"));
        assert!(markup.head.is_empty());
    }

    #[test]
    fn test_ga4_with_id_is_emitted() {
        let analytics = AnalyticsConfig {
            ga4: tracker(true, "G-TEST123"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "Nightfall - Aria", "FR");
        assert!(markup.head.contains("gtag/js?id=G-TEST123"));
        assert!(markup.head.contains("gtag('config', \"G-TEST123\""));
        assert!(markup.head.contains("\"Nightfall - Aria\""));
    }

    #[test]
    fn test_disabled_tracker_with_id_is_not_emitted() {
        let analytics = AnalyticsConfig {
            meta_pixel: tracker(false, "123456"),
            tiktok_pixel: tracker(false, "TT1"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(markup.head.is_empty());
        assert!(markup.body.is_empty());
    }

    #[test]
    fn test_gtm_emits_head_and_noscript() {
        let analytics = AnalyticsConfig {
            gtm: tracker(true, "GTM-ABC"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(markup.head.contains("'dataLayer',\"GTM-ABC\""));
        assert!(markup.body.contains("ns.html?id=GTM-ABC"));
    }

    #[test]
    fn test_meta_and_tiktok() {
        let analytics = AnalyticsConfig {
            meta_pixel: tracker(true, "987"),
            tiktok_pixel: tracker(true, "CTT9"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(markup.head.contains("fbq('init', \"987\")"));
        assert!(markup.head.contains("ttq.load(\"CTT9\")"));
        assert!(markup.body.contains("facebook.com/tr?id=987"));
    }

    #[test]
    fn test_google_ads_alone_loads_gtag() {
        let analytics = AnalyticsConfig {
            google_ads: tracker(true, "AW-1"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(markup.head.contains("gtag/js?id=AW-1"));
        assert!(markup.head.contains("gtag('config', \"AW-1\")"));
    }

    #[test]
    fn test_hostile_id_cannot_break_out() {
        let analytics = AnalyticsConfig {
            ga4: tracker(true, "');</script><script>alert(1)//"),
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert_eq!(markup.head.matches("</script>").count(), 2);
    }

    #[test]
    fn test_custom_scripts_follow_position() {
        let analytics = AnalyticsConfig {
            custom_scripts: vec![
                CustomScript {
                    name: Some("hotjar".into()),
                    script: "<script>/*head*/</script>".into(),
                    position: ScriptPosition::Head,
                },
                CustomScript {
                    name: None,
                    script: "<script>/*body*/</script>".into(),
                    position: ScriptPosition::Body,
                },
            ],
            ..Default::default()
        };
        let markup = analytics_markup(&analytics, "t", "FR");
        assert!(markup.head.contains("/*head*/"));
        assert!(markup.body.contains("/*body*/"));
        assert!(!markup.head.contains("/*body*/"));
    }
}
